//! Transcoder session assembly.
//!
//! The video source always goes to the transcoder as-is. An HLS audio source
//! is downloaded segment by segment into a fresh working directory and merged
//! into one local file first; any other audio source is passed through. The
//! caller's [`SessionConfigurator`] then sets output options and hooks.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::hls::{merge_segments, SegmentFetcher, SegmentProgress};
use crate::locator::{ToolPaths, TRANSCODER};
use crate::source::MediaSource;
use crate::transcode::{OutputTarget, PipedTranscode, TranscodeSession};
use crate::workdir::WorkDir;

/// Merged audio file name inside the working directory.
const STAGED_AUDIO: &str = "audio.ts";

/// Inputs for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    /// Passed to the transcoder unchanged, even when it is a manifest.
    pub video: String,
    pub audio: Option<MediaSource>,
}

impl SessionRequest {
    pub fn new(video: impl Into<String>) -> Self {
        Self {
            video: video.into(),
            audio: None,
        }
    }

    pub fn with_audio(mut self, audio: MediaSource) -> Self {
        self.audio = Some(audio);
        self
    }
}

/// Caller-supplied step that finishes an input-configured session.
///
/// Implemented for any `FnOnce(TranscodeSession) -> TranscodeSession`.
pub trait SessionConfigurator {
    fn configure(self, session: TranscodeSession) -> TranscodeSession;
}

impl<F> SessionConfigurator for F
where
    F: FnOnce(TranscodeSession) -> TranscodeSession,
{
    fn configure(self, session: TranscodeSession) -> TranscodeSession {
        self(session)
    }
}

/// Result of [`SessionBuilder::build`].
pub enum SessionOutcome {
    /// Configured and ready for [`TranscodeSession::run`].
    Ready(TranscodeSession),
    /// The configurator chose pipe output, so the transcoder is already running.
    Piped(PipedTranscode),
}

/// Builds transcoder sessions, staging HLS audio when needed.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    transcoder: PathBuf,
    fetcher: SegmentFetcher,
    work_root: PathBuf,
}

impl SessionBuilder {
    /// Fails with `ToolNotFound` when no transcoder path is known.
    pub fn new(tools: &ToolPaths, config: &CoreConfig) -> CoreResult<Self> {
        Ok(Self {
            transcoder: tools.require(TRANSCODER)?.to_path_buf(),
            fetcher: SegmentFetcher::new(config.segment_concurrency),
            work_root: config.work_root.clone(),
        })
    }

    pub fn with_fetcher(mut self, fetcher: SegmentFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn transcoder(&self) -> &Path {
        &self.transcoder
    }

    /// Assemble inputs, apply `configurator`, and spawn piped sessions.
    ///
    /// `on_progress` fires after each downloaded audio segment.
    pub async fn build<C, P>(
        &self,
        request: SessionRequest,
        configurator: C,
        on_progress: P,
    ) -> CoreResult<SessionOutcome>
    where
        C: SessionConfigurator,
        P: Fn(SegmentProgress) + Send + Sync,
    {
        let mut session = TranscodeSession::new(&self.transcoder).input(request.video);

        match request.audio {
            Some(MediaSource::HlsManifest(url)) => {
                let (work_dir, staged) = self.stage_audio(&url, on_progress).await?;
                session = session
                    .input(staged.to_string_lossy())
                    .attach_work_dir(work_dir);
            }
            Some(MediaSource::Direct(url)) => session = session.input(url),
            None => {}
        }

        let session = configurator.configure(session);

        if session.output_target() == Some(&OutputTarget::Pipe) {
            Ok(SessionOutcome::Piped(session.spawn_piped().await?))
        } else {
            Ok(SessionOutcome::Ready(session))
        }
    }

    async fn stage_audio<P>(&self, manifest_url: &str, on_progress: P) -> CoreResult<(WorkDir, PathBuf)>
    where
        P: Fn(SegmentProgress) + Send + Sync,
    {
        let work_dir = WorkDir::create(&self.work_root).await?;

        match self.assemble(&work_dir, manifest_url, on_progress).await {
            Ok(staged) => {
                info!(manifest = %manifest_url, staged = %staged.display(), "Staged HLS audio");
                Ok((work_dir, staged))
            }
            Err(e) => {
                warn!(manifest = %manifest_url, "HLS staging failed: {}", e);
                work_dir.cleanup().await;
                Err(e)
            }
        }
    }

    async fn assemble<P>(&self, work_dir: &WorkDir, manifest_url: &str, on_progress: P) -> CoreResult<PathBuf>
    where
        P: Fn(SegmentProgress) + Send + Sync,
    {
        let manifest = self.fetcher.fetch_manifest(manifest_url).await?;
        let segments = self
            .fetcher
            .download_all(&manifest, work_dir.path(), on_progress)
            .await?;

        let staged = work_dir.join(STAGED_AUDIO);
        merge_segments(&segments, &staged).await?;
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VIDEO: &str = "https://rr1.googlevideo.com/videoplayback?itag=137";

    fn builder(work_root: &Path, transcoder: &str) -> SessionBuilder {
        let tools = ToolPaths::new().with(TRANSCODER, transcoder);
        let config = CoreConfig {
            work_root: work_root.to_path_buf(),
            ..Default::default()
        };
        SessionBuilder::new(&tools, &config).unwrap()
    }

    fn ready(outcome: SessionOutcome) -> TranscodeSession {
        match outcome {
            SessionOutcome::Ready(session) => session,
            SessionOutcome::Piped(_) => panic!("expected a ready session"),
        }
    }

    #[test]
    fn test_requires_transcoder() {
        let err = SessionBuilder::new(&ToolPaths::new(), &CoreConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_manifest_404_leaves_no_work_dir() {
        let server = MockServer::start().await;
        let root = TempDir::new().unwrap();

        let request = SessionRequest::new(VIDEO).with_audio(MediaSource::HlsManifest(format!(
            "{}/audio/index.m3u8",
            server.uri()
        )));
        let result = builder(root.path(), "ffmpeg")
            .build(request, |s: TranscodeSession| s.output("out.mp4"), |_| {})
            .await;

        assert!(matches!(result, Err(CoreError::SegmentTransfer { .. })));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    const TWO_SEGMENTS: &str =
        "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:5\n#EXTINF:5.0,\nok.ts\n#EXTINF:5.0,\nmissing.ts\n#EXT-X-ENDLIST\n";

    async fn serve(server: &MockServer, route: &str, body: &[u8]) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_segment_404_leaves_no_work_dir() {
        let server = MockServer::start().await;
        serve(&server, "/a/index.m3u8", TWO_SEGMENTS.as_bytes()).await;
        serve(&server, "/a/ok.ts", b"ok").await;

        let root = TempDir::new().unwrap();
        let request = SessionRequest::new(VIDEO)
            .with_audio(MediaSource::HlsManifest(format!("{}/a/index.m3u8", server.uri())));
        let result = builder(root.path(), "ffmpeg")
            .build(request, |s: TranscodeSession| s.output("out.mp4"), |_| {})
            .await;

        match result {
            Err(CoreError::SegmentTransfer { url, .. }) => assert!(url.ends_with("/a/missing.ts")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a segment transfer failure"),
        }
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_merge_failure_leaves_no_work_dir() {
        let server = MockServer::start().await;
        serve(&server, "/a/index.m3u8", TWO_SEGMENTS.as_bytes()).await;
        serve(&server, "/a/ok.ts", b"ok").await;
        serve(&server, "/a/missing.ts", b"late").await;

        let root = TempDir::new().unwrap();
        let work_root = root.path().to_path_buf();
        // A directory in place of the merged file makes the merge fail.
        let block_output = move |p: SegmentProgress| {
            if p.completed == p.total {
                let work_dir = std::fs::read_dir(&work_root)
                    .unwrap()
                    .next()
                    .unwrap()
                    .unwrap()
                    .path();
                std::fs::create_dir_all(work_dir.join(STAGED_AUDIO)).unwrap();
            }
        };

        let request = SessionRequest::new(VIDEO)
            .with_audio(MediaSource::HlsManifest(format!("{}/a/index.m3u8", server.uri())));
        let result = builder(root.path(), "ffmpeg")
            .build(request, |s: TranscodeSession| s.output("out.mp4"), block_output)
            .await;

        match result {
            Err(CoreError::Merge { path, .. }) => assert!(path.ends_with(STAGED_AUDIO)),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a merge failure"),
        }
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_hls_audio_is_staged_as_second_input() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio/index.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:5\n#EXTINF:5.0,\nseg0.ts\n#EXTINF:5.0,\nseg1.ts\n#EXT-X-ENDLIST\n",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/audio/seg0.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"first-".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/audio/seg1.ts"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"second".to_vec()))
            .mount(&server)
            .await;

        let root = TempDir::new().unwrap();
        let fractions = Mutex::new(Vec::new());
        let request = SessionRequest::new(VIDEO).with_audio(MediaSource::detect(format!(
            "{}/audio/index.m3u8",
            server.uri()
        )));

        let session = ready(
            builder(root.path(), "ffmpeg")
                .build(
                    request,
                    |s: TranscodeSession| s.video_codec("copy").audio_codec("aac").output("out.mp4"),
                    |p| fractions.lock().unwrap().push(p.fraction()),
                )
                .await
                .unwrap(),
        );

        assert_eq!(session.inputs()[0], VIDEO);
        let staged = PathBuf::from(&session.inputs()[1]);
        assert!(staged.starts_with(session.work_dir().unwrap()));
        assert_eq!(std::fs::read(&staged).unwrap(), b"first-second");
        assert_eq!(fractions.into_inner().unwrap().last().copied(), Some(1.0));

        let work_dir = session.work_dir().unwrap().to_path_buf();
        session.discard().await;
        assert!(!work_dir.exists());
    }

    #[tokio::test]
    async fn test_direct_audio_is_passed_through() {
        let root = TempDir::new().unwrap();
        let audio = "https://rr1.googlevideo.com/videoplayback?itag=251";
        let request = SessionRequest::new(VIDEO).with_audio(MediaSource::detect(audio));

        let session = ready(
            builder(root.path(), "ffmpeg")
                .build(request, |s: TranscodeSession| s.output("out.mkv"), |_| {})
                .await
                .unwrap(),
        );

        assert_eq!(session.inputs(), &[VIDEO.to_string(), audio.to_string()]);
        assert!(session.work_dir().is_none());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_output_spawns_transcoder() {
        use tokio::io::AsyncReadExt;

        let root = TempDir::new().unwrap();
        let outcome = builder(root.path(), "/bin/echo")
            .build(SessionRequest::new(VIDEO), |s: TranscodeSession| s.pipe(), |_| {})
            .await
            .unwrap();

        let mut piped = match outcome {
            SessionOutcome::Piped(piped) => piped,
            SessionOutcome::Ready(_) => panic!("expected a piped session"),
        };
        let mut text = String::new();
        piped
            .take_stdout()
            .unwrap()
            .read_to_string(&mut text)
            .await
            .unwrap();
        piped.wait().await.unwrap();

        assert!(text.contains(VIDEO));
    }
}
