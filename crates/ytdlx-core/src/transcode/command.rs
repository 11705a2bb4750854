//! Transcoder session builder and runner.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::progress::{parse_progress_line, TranscodeProgress};
use crate::error::{CoreError, CoreResult};
use crate::workdir::WorkDir;

pub type StartHook = Arc<dyn Fn(&[String]) + Send + Sync>;
pub type ProgressHook = Arc<dyn Fn(TranscodeProgress) + Send + Sync>;
pub type EndHook = Arc<dyn Fn() + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&CoreError) + Send + Sync>;

/// Where the transcoder writes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    /// Standard output, read through [`PipedTranscode::take_stdout`].
    Pipe,
}

impl OutputTarget {
    fn as_arg(&self) -> String {
        match self {
            OutputTarget::File(path) => path.to_string_lossy().into_owned(),
            OutputTarget::Pipe => "pipe:1".to_string(),
        }
    }
}

#[derive(Clone, Default)]
struct Hooks {
    on_start: Option<StartHook>,
    on_progress: Option<ProgressHook>,
    on_end: Option<EndHook>,
    on_error: Option<ErrorHook>,
}

impl Hooks {
    fn finish(&self, result: &CoreResult<()>) {
        match result {
            Ok(()) => {
                if let Some(hook) = &self.on_end {
                    hook();
                }
            }
            Err(e) => self.error(e),
        }
    }

    fn error(&self, error: &CoreError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }
}

/// One transcoder invocation, configured by the caller.
///
/// The session owns any staging directory attached to it. [`run`](Self::run),
/// [`discard`](Self::discard) and the piped variant's
/// [`wait`](PipedTranscode::wait) remove it; dropping the session does not.
pub struct TranscodeSession {
    program: PathBuf,
    inputs: Vec<String>,
    input_args: Vec<String>,
    output_args: Vec<String>,
    output: Option<OutputTarget>,
    overwrite: bool,
    log_level: String,
    timeout: Option<Duration>,
    hooks: Hooks,
    work_dir: Option<WorkDir>,
}

impl TranscodeSession {
    /// Create an empty session for the transcoder at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            inputs: Vec::new(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            output: None,
            overwrite: true,
            log_level: "error".to_string(),
            timeout: None,
            hooks: Hooks::default(),
            work_dir: None,
        }
    }

    /// Add an input URL or file path.
    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Add arguments placed before the first input.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    pub fn input_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add arguments placed after the inputs.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-af").output_arg(filter)
    }

    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Select a stream, e.g. `0:v:0`.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Output container, e.g. `mp4` or `matroska`.
    pub fn format(self, container: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(container)
    }

    pub fn video_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:v").output_arg(bitrate)
    }

    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Write to a file.
    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.output = Some(OutputTarget::File(path.as_ref().to_path_buf()));
        self
    }

    /// Write to standard output.
    pub fn pipe(mut self) -> Self {
        self.output = Some(OutputTarget::Pipe);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Kill the transcoder if it runs longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Called with the full argument list right after spawning.
    pub fn on_start(mut self, hook: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.hooks.on_start = Some(Arc::new(hook));
        self
    }

    pub fn on_progress(mut self, hook: impl Fn(TranscodeProgress) + Send + Sync + 'static) -> Self {
        self.hooks.on_progress = Some(Arc::new(hook));
        self
    }

    pub fn on_end(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.on_end = Some(Arc::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&CoreError) + Send + Sync + 'static) -> Self {
        self.hooks.on_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn attach_work_dir(mut self, work_dir: WorkDir) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn output_target(&self) -> Option<&OutputTarget> {
        self.output.as_ref()
    }

    /// Staging directory owned by this session, if any.
    pub fn work_dir(&self) -> Option<&Path> {
        self.work_dir.as_ref().map(WorkDir::path)
    }

    /// Build the transcoder argument list.
    pub fn build_args(&self) -> CoreResult<Vec<String>> {
        if self.inputs.is_empty() {
            return Err(CoreError::transcode_failed("session has no inputs", None));
        }
        let output = self
            .output
            .as_ref()
            .ok_or_else(|| CoreError::transcode_failed("session has no output target", None))?;

        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress goes to stderr so a piped stdout stays clean.
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        args.extend(self.input_args.iter().cloned());

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(output.as_arg());

        Ok(args)
    }

    /// Run to completion, then remove the staging directory.
    ///
    /// Piped sessions must use [`spawn_piped`](Self::spawn_piped) instead.
    pub async fn run(mut self) -> CoreResult<()> {
        let result = self.execute().await;
        self.hooks.finish(&result);
        if let Some(work_dir) = self.work_dir.take() {
            work_dir.cleanup().await;
        }
        result
    }

    /// Drop the session without running it, removing the staging directory.
    pub async fn discard(mut self) {
        if let Some(work_dir) = self.work_dir.take() {
            work_dir.cleanup().await;
        }
    }

    /// Spawn a piped session and hand back its output stream.
    pub async fn spawn_piped(mut self) -> CoreResult<PipedTranscode> {
        let spawned = match self.output {
            Some(OutputTarget::Pipe) => self.spawn(Stdio::piped()),
            _ => Err(CoreError::transcode_failed(
                "spawn_piped requires a pipe output target",
                None,
            )),
        };

        match spawned {
            Ok((mut child, stderr)) => {
                let stdout = child.stdout.take();
                Ok(PipedTranscode {
                    child,
                    stdout,
                    stderr_reader: self.read_stderr(stderr),
                    hooks: self.hooks.clone(),
                    work_dir: self.work_dir.take(),
                })
            }
            Err(e) => {
                self.hooks.error(&e);
                if let Some(work_dir) = self.work_dir.take() {
                    work_dir.cleanup().await;
                }
                Err(e)
            }
        }
    }

    async fn execute(&self) -> CoreResult<()> {
        if self.output == Some(OutputTarget::Pipe) {
            return Err(CoreError::transcode_failed(
                "pipe output requires spawn_piped",
                None,
            ));
        }

        let (mut child, stderr) = self.spawn(Stdio::null())?;
        let reader = self.read_stderr(stderr);

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("Transcoder timed out after {} seconds, killing process", limit.as_secs());
                    let _ = child.kill().await;
                    reader.abort();
                    return Err(CoreError::Timeout(limit.as_secs()));
                }
            },
            None => child.wait().await?,
        };

        let last_line = reader.await.ok().flatten();
        check_status(status, last_line)?;

        if let Some(OutputTarget::File(path)) = &self.output {
            info!(output = %path.display(), "Transcode finished");
        }
        Ok(())
    }

    fn spawn(&self, stdout: Stdio) -> CoreResult<(Child, ChildStderr)> {
        let args = self.build_args()?;
        debug!("Running transcoder: {} {}", self.program.display(), args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CoreError::transcode_failed(
                    format!("failed to spawn {}: {}", self.program.display(), e),
                    None,
                )
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CoreError::transcode_failed("stderr not captured", None))?;

        if let Some(hook) = &self.hooks.on_start {
            hook(&args);
        }

        Ok((child, stderr))
    }

    /// Feed progress blocks to the hook; keep the last log line for errors.
    fn read_stderr(&self, stderr: ChildStderr) -> JoinHandle<Option<String>> {
        let on_progress = self.hooks.on_progress.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut current = TranscodeProgress::default();
            let mut last_line = None;

            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(progress) = parse_progress_line(&line, &mut current) {
                    if let Some(hook) = &on_progress {
                        hook(progress);
                    }
                } else if !line.contains('=') && !line.trim().is_empty() {
                    last_line = Some(line);
                }
            }
            last_line
        })
    }
}

fn check_status(status: ExitStatus, last_line: Option<String>) -> CoreResult<()> {
    if status.success() {
        Ok(())
    } else {
        Err(CoreError::transcode_failed(
            last_line.unwrap_or_else(|| "Transcoder exited with non-zero status".to_string()),
            status.code(),
        ))
    }
}

/// A transcoder writing to a pipe.
///
/// Read the output from [`take_stdout`](Self::take_stdout) while the process
/// runs, then call [`wait`](Self::wait).
pub struct PipedTranscode {
    child: Child,
    stdout: Option<ChildStdout>,
    stderr_reader: JoinHandle<Option<String>>,
    hooks: Hooks,
    work_dir: Option<WorkDir>,
}

impl PipedTranscode {
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Wait for exit, fire the end or error hook, and remove the staging directory.
    pub async fn wait(mut self) -> CoreResult<()> {
        // An unread pipe would block the transcoder forever.
        drop(self.stdout.take());

        let result = match self.child.wait().await {
            Ok(status) => {
                let last_line = (&mut self.stderr_reader).await.ok().flatten();
                check_status(status, last_line)
            }
            Err(e) => Err(e.into()),
        };

        self.hooks.finish(&result);
        if let Some(work_dir) = self.work_dir.take() {
            work_dir.cleanup().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_build_args_orders_inputs_and_output() {
        let session = TranscodeSession::new("ffmpeg")
            .input("https://cdn.example.com/video.mp4")
            .input("/tmp/ytdlx-1/audio.ts")
            .input_arg("-re")
            .map("0:v:0")
            .map("1:a:0")
            .video_codec("copy")
            .audio_codec("aac")
            .format("matroska")
            .output("out.mkv");

        let args = session.build_args().unwrap();
        assert_eq!(
            args,
            vec![
                "-y", "-v", "error", "-progress", "pipe:2", "-re",
                "-i", "https://cdn.example.com/video.mp4",
                "-i", "/tmp/ytdlx-1/audio.ts",
                "-map", "0:v:0", "-map", "1:a:0",
                "-c:v", "copy", "-c:a", "aac", "-f", "matroska", "out.mkv",
            ]
        );
    }

    #[test]
    fn test_build_args_requires_input_and_output() {
        assert!(TranscodeSession::new("ffmpeg").output("o.mp4").build_args().is_err());
        assert!(TranscodeSession::new("ffmpeg").input("i.mp4").build_args().is_err());
        let piped = TranscodeSession::new("ffmpeg").input("i.mp4").pipe();
        assert_eq!(piped.build_args().unwrap().last().unwrap(), "pipe:1");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_fires_hooks() {
        let started = Arc::new(AtomicUsize::new(0));
        let ended = Arc::new(AtomicUsize::new(0));
        let (s, e) = (started.clone(), ended.clone());

        TranscodeSession::new("/bin/echo")
            .input("in.mp4")
            .output("out.mp4")
            .on_start(move |args| {
                assert_eq!(args[0], "-y");
                s.fetch_add(1, Ordering::SeqCst);
            })
            .on_end(move || {
                e.fetch_add(1, Ordering::SeqCst);
            })
            .run()
            .await
            .unwrap();

        assert_eq!(started.load(Ordering::SeqCst), 1);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_cleans_work_dir() {
        let root = tempfile::TempDir::new().unwrap();
        let work_dir = WorkDir::create(root.path()).await.unwrap();
        let staged = work_dir.path().to_path_buf();
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = errors.clone();

        let err = TranscodeSession::new("/bin/false")
            .input("in.mp4")
            .output("out.mp4")
            .attach_work_dir(work_dir)
            .on_error(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            })
            .run()
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::TranscodeFailed { exit_code: Some(1), .. }));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert!(!staged.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_piped_streams_stdout() {
        use tokio::io::AsyncReadExt;

        let mut piped = TranscodeSession::new("/bin/echo")
            .input("in.mp4")
            .pipe()
            .spawn_piped()
            .await
            .unwrap();

        let mut stdout = piped.take_stdout().unwrap();
        let mut text = String::new();
        stdout.read_to_string(&mut text).await.unwrap();
        piped.wait().await.unwrap();

        assert!(text.trim_end().ends_with("-i in.mp4 pipe:1"));
    }

    #[tokio::test]
    async fn test_run_rejects_pipe_target() {
        let err = TranscodeSession::new("ffmpeg")
            .input("in.mp4")
            .pipe()
            .run()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("spawn_piped"));
    }
}
