//! Top-level extractor record and its descriptive projection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::format::RawFormat;
use crate::thumbnail::RawThumbnail;

/// Descriptive fields passed through from the extractor record unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetaData {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fulltitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_url: Option<String>,
    #[serde(default)]
    pub channel_follower_count: Option<u64>,
    #[serde(default)]
    pub channel_is_verified: Option<bool>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub uploader_id: Option<String>,
    #[serde(default)]
    pub uploader_url: Option<String>,
    /// Upload date as YYYYMMDD
    #[serde(default)]
    pub upload_date: Option<String>,
    /// Upload time as Unix seconds
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub release_timestamp: Option<i64>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub duration_string: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub age_limit: Option<u32>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub live_status: Option<String>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(default)]
    pub was_live: Option<bool>,
    #[serde(default)]
    pub playable_in_embed: Option<bool>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub extractor: Option<String>,
}

/// The full JSON document printed by the extractor for one video.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideoInfo {
    #[serde(flatten)]
    pub meta: MetaData,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
    #[serde(default)]
    pub thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub chapters: Option<Vec<Value>>,
    #[serde(default)]
    pub subtitles: Option<Map<String, Value>>,
    #[serde(default)]
    pub automatic_captions: Option<Map<String, Value>>,
    #[serde(default)]
    pub heatmap: Option<Vec<Value>>,
}
