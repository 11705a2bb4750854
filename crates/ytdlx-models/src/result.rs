//! Assembled extraction result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::group::{AudioOnly, VideoOnly};
use crate::metadata::MetaData;
use crate::thumbnail::Thumbnails;

/// Classified view of one extractor run.
///
/// Built fresh per request and owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionResult {
    pub meta_data: MetaData,
    pub audio_only: AudioOnly,
    pub video_only: VideoOnly,
    pub thumbnails: Thumbnails,
    #[serde(default)]
    pub chapters: Vec<Value>,
    #[serde(default)]
    pub subtitles: Map<String, Value>,
    #[serde(default)]
    pub automatic_captions: Map<String, Value>,
    #[serde(default)]
    pub heatmap: Vec<Value>,
}
