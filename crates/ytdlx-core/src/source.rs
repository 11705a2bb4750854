//! Transcoder input sources.

use std::fmt;
use url::Url;
use ytdlx_models::{CleanedAudioFormat, CleanedVideoFormat};

use crate::error::{CoreError, CoreResult};

/// Where a transcoder input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Handed to the transcoder as-is.
    Direct(String),
    /// HLS media playlist; staged locally when used as the audio source.
    HlsManifest(String),
}

impl MediaSource {
    /// Classify a URL by its path: `.m3u8` files and `/manifest/hls` routes
    /// are manifests, everything else is direct.
    pub fn detect(url: impl Into<String>) -> Self {
        let url = url.into();
        if looks_like_manifest(&url) {
            MediaSource::HlsManifest(url)
        } else {
            MediaSource::Direct(url)
        }
    }

    pub fn from_audio(format: &CleanedAudioFormat) -> CoreResult<Self> {
        from_format(
            &format.format_id,
            format.protocol.as_deref(),
            format.url.as_deref(),
            format.manifest_url.as_deref(),
        )
    }

    pub fn from_video(format: &CleanedVideoFormat) -> CoreResult<Self> {
        from_format(
            &format.format_id,
            format.protocol.as_deref(),
            format.url.as_deref(),
            format.manifest_url.as_deref(),
        )
    }

    pub fn url(&self) -> &str {
        match self {
            MediaSource::Direct(url) | MediaSource::HlsManifest(url) => url,
        }
    }

    pub fn is_manifest(&self) -> bool {
        matches!(self, MediaSource::HlsManifest(_))
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url())
    }
}

fn from_format(
    format_id: &str,
    protocol: Option<&str>,
    url: Option<&str>,
    manifest_url: Option<&str>,
) -> CoreResult<MediaSource> {
    let is_hls = protocol.is_some_and(|p| p.to_ascii_lowercase().contains("m3u8"));
    match (url.or(manifest_url), is_hls) {
        (Some(url), true) => Ok(MediaSource::HlsManifest(url.to_string())),
        (Some(url), false) => Ok(MediaSource::detect(url)),
        (None, _) => Err(CoreError::InvalidUrl(format!(
            "format {} has no URL",
            format_id
        ))),
    }
}

fn looks_like_manifest(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase(),
    };
    path.ends_with(".m3u8") || path.contains("/manifest/hls")
}
