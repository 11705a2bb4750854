//! Thumbnail models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Thumbnail entry as emitted by the extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawThumbnail {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    /// Resolution marker ("1280x720"); entries without one are dropped
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub preference: Option<i64>,
}

/// Thumbnail stripped to what callers need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ThumbnailEntry {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl ThumbnailEntry {
    /// Pixel area used for ranking.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// All usable thumbnails plus the largest and smallest by area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Thumbnails {
    pub highest: Option<ThumbnailEntry>,
    pub lowest: Option<ThumbnailEntry>,
    pub all: Vec<ThumbnailEntry>,
}
