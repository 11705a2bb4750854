//! Stream format models.
//!
//! [`RawFormat`] mirrors one entry of the extractor's `formats` array.
//! Cleaning splits it into [`CleanedAudioFormat`] or [`CleanedVideoFormat`],
//! each of which keeps only the fields meaningful for its domain. The two
//! cleaned types share no domain fields, so a cleaned audio entry can never
//! carry a video codec or resolution and vice versa.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Language tag used when a format note carries none.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// One format entry as emitted by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawFormat {
    /// Opaque format identifier (usually numeric, e.g. "251" or "251-drc")
    #[serde(default)]
    pub format_id: String,
    /// Free-text note ("English original, medium", "1080p HDR", ...)
    #[serde(default)]
    pub format_note: Option<String>,
    /// Resolution tag ("audio only" or "1920x1080")
    #[serde(default)]
    pub resolution: Option<String>,
    /// Direct media URL (or media playlist URL for HLS formats)
    #[serde(default)]
    pub url: Option<String>,
    /// Manifest the format was discovered from
    #[serde(default)]
    pub manifest_url: Option<String>,
    /// Transfer protocol ("https", "m3u8_native", ...)
    #[serde(default)]
    pub protocol: Option<String>,
    /// Container extension
    #[serde(default)]
    pub ext: Option<String>,
    /// Container name
    #[serde(default)]
    pub container: Option<String>,
    /// Total bitrate in kbit/s
    #[serde(default)]
    pub tbr: Option<f64>,
    /// Audio bitrate in kbit/s
    #[serde(default)]
    pub abr: Option<f64>,
    /// Video bitrate in kbit/s
    #[serde(default)]
    pub vbr: Option<f64>,
    /// Audio sample rate in Hz
    #[serde(default)]
    pub asr: Option<u64>,
    /// Number of audio channels
    #[serde(default)]
    pub audio_channels: Option<u32>,
    /// Audio codec ("opus", "mp4a.40.2", "none")
    #[serde(default)]
    pub acodec: Option<String>,
    /// Declared audio language
    #[serde(default)]
    pub language: Option<String>,
    /// Video codec ("vp9", "avc1.640028", "none")
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Frame width in pixels
    #[serde(default)]
    pub width: Option<u32>,
    /// Frame height in pixels
    #[serde(default)]
    pub height: Option<u32>,
    /// Frames per second
    #[serde(default)]
    pub fps: Option<f64>,
    /// Dynamic range tag ("SDR", "HDR10", ...)
    #[serde(default)]
    pub dynamic_range: Option<String>,
    /// Aspect ratio as reported by the extractor
    #[serde(default)]
    pub aspect_ratio: Option<f64>,
    /// Exact file size in bytes
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Approximate file size in bytes
    #[serde(default)]
    pub filesize_approx: Option<u64>,
    /// Extractor quality ranking
    #[serde(default)]
    pub quality: Option<f64>,
    /// Extractor source preference
    #[serde(default)]
    pub source_preference: Option<i64>,
    /// Human-readable format description (bookkeeping)
    #[serde(default)]
    pub format: Option<String>,
    /// Request headers the extractor would send (bookkeeping)
    #[serde(default)]
    pub http_headers: Option<Value>,
    /// Fragment list for fragmented protocols (bookkeeping)
    #[serde(default)]
    pub fragments: Option<Value>,
    /// Downloader hints (bookkeeping)
    #[serde(default)]
    pub downloader_options: Option<Value>,
    /// DRM marker; boolean or "maybe" depending on extractor version (bookkeeping)
    #[serde(default)]
    pub has_drm: Option<Value>,
}

impl RawFormat {
    fn note_contains(&self, needle: &str) -> bool {
        self.format_note
            .as_deref()
            .is_some_and(|note| note.to_lowercase().contains(needle))
    }

    /// Storyboard entries are image sprites, not media.
    pub fn is_storyboard(&self) -> bool {
        self.note_contains("storyboard")
    }

    /// Whether the resolution tag marks this as an audio-only stream.
    pub fn is_audio_only(&self) -> bool {
        self.resolution
            .as_deref()
            .is_some_and(|res| res.to_lowercase().contains("audio"))
    }

    /// Whether the note marks a dynamic-range-compressed audio variant.
    pub fn is_drc(&self) -> bool {
        self.note_contains("drc")
    }

    /// Whether the note marks an HDR video variant.
    pub fn is_hdr(&self) -> bool {
        self.note_contains("hdr")
    }

    /// Whether the dynamic range tag is exactly "SDR".
    pub fn is_sdr(&self) -> bool {
        self.dynamic_range.as_deref() == Some("SDR")
    }

    /// Project onto the audio domain.
    pub fn to_audio(&self) -> CleanedAudioFormat {
        CleanedAudioFormat {
            format_id: self.format_id.clone(),
            format_note: self.format_note.clone(),
            url: self.url.clone(),
            manifest_url: self.manifest_url.clone(),
            protocol: self.protocol.clone(),
            ext: self.ext.clone(),
            container: self.container.clone(),
            tbr: self.tbr,
            abr: self.abr,
            asr: self.asr,
            audio_channels: self.audio_channels,
            acodec: self.acodec.clone(),
            language: self.language.clone(),
            filesize: self.filesize.or(self.filesize_approx),
            quality: self.quality,
        }
    }

    /// Project onto the video domain.
    pub fn to_video(&self) -> CleanedVideoFormat {
        CleanedVideoFormat {
            format_id: self.format_id.clone(),
            format_note: self.format_note.clone(),
            url: self.url.clone(),
            manifest_url: self.manifest_url.clone(),
            protocol: self.protocol.clone(),
            ext: self.ext.clone(),
            container: self.container.clone(),
            tbr: self.tbr,
            vbr: self.vbr,
            vcodec: self.vcodec.clone(),
            resolution: self.resolution.clone(),
            width: self.width,
            height: self.height,
            fps: self.fps,
            dynamic_range: self.dynamic_range.clone(),
            aspect_ratio: self.aspect_ratio,
            filesize: self.filesize.or(self.filesize_approx),
            quality: self.quality,
        }
    }
}

/// Audio-only format with video and bookkeeping fields removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CleanedAudioFormat {
    pub format_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tbr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asr: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

impl CleanedAudioFormat {
    /// Language tag detected from the note: the leading run of characters
    /// before the first space or hyphen.
    pub fn language_tag(&self) -> String {
        language_prefix(self.format_note.as_deref().unwrap_or_default())
    }

    /// Numeric value of the format id, see [`numeric_id`].
    pub fn numeric_id(&self) -> Option<f64> {
        numeric_id(&self.format_id)
    }
}

/// Video-only format with audio and bookkeeping fields removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CleanedVideoFormat {
    pub format_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tbr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vbr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcodec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
}

impl CleanedVideoFormat {
    /// Bitrate used for ranking: video bitrate, else total bitrate.
    pub fn bitrate(&self) -> Option<f64> {
        self.vbr.or(self.tbr)
    }
}

/// Leading run of non-space, non-hyphen characters, or [`UNKNOWN_LANGUAGE`].
pub fn language_prefix(note: &str) -> String {
    let prefix: String = note
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if prefix.is_empty() {
        UNKNOWN_LANGUAGE.to_string()
    } else {
        prefix
    }
}

/// Numeric value of a format id, read from its leading digits.
///
/// "251" and "251-drc" both yield 251; ids without a numeric prefix yield
/// `None` and never win a numeric comparison.
pub fn numeric_id(id: &str) -> Option<f64> {
    let digits: String = id
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}
