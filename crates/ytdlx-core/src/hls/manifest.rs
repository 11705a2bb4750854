//! Media playlist parsing.

use hls_m3u8::MediaPlaylist;
use url::Url;

use crate::error::{CoreError, CoreResult};

/// Absolute segment URLs of one media playlist, in playlist order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentManifest {
    pub base_url: Url,
    pub segments: Vec<Url>,
}

impl SegmentManifest {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Parse media playlist text and resolve every segment URI against `base_url`.
pub fn parse_manifest(text: &str, base_url: &Url) -> CoreResult<SegmentManifest> {
    let playlist =
        MediaPlaylist::try_from(text).map_err(|e| CoreError::ManifestParse(e.to_string()))?;

    let segments = playlist
        .segments
        .iter()
        .map(|(_, segment)| {
            base_url.join(segment.uri().trim()).map_err(|e| {
                CoreError::InvalidUrl(format!("{} relative to {}: {}", segment.uri(), base_url, e))
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(SegmentManifest {
        base_url: base_url.clone(),
        segments,
    })
}
