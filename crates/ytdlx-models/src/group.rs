//! Grouped format collections.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::format::{CleanedAudioFormat, CleanedVideoFormat};

/// Audio formats sharing one detected language tag.
///
/// Only built for non-empty buckets, so `highest` and `lowest` always exist.
/// Both are chosen by the numeric value of the format id, not by bitrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LanguageGroup {
    pub highest: CleanedAudioFormat,
    pub lowest: CleanedAudioFormat,
    pub combined: Vec<CleanedAudioFormat>,
}

impl LanguageGroup {
    pub fn len(&self) -> usize {
        self.combined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }
}

/// Audio-only formats split into standard and DRC language maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioOnly {
    pub standard: BTreeMap<String, LanguageGroup>,
    pub drc: BTreeMap<String, LanguageGroup>,
}

impl AudioOnly {
    /// Look up a language group in the standard or DRC map.
    pub fn language(&self, language: &str, drc: bool) -> Option<&LanguageGroup> {
        if drc {
            self.drc.get(language)
        } else {
            self.standard.get(language)
        }
    }

    /// All detected languages across both maps, sorted and deduplicated.
    pub fn languages(&self) -> Vec<&str> {
        let mut langs: Vec<&str> = self
            .standard
            .keys()
            .chain(self.drc.keys())
            .map(String::as_str)
            .collect();
        langs.sort_unstable();
        langs.dedup();
        langs
    }
}

/// Video dynamic range bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DynamicRange {
    Sdr,
    Hdr,
}

impl DynamicRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            DynamicRange::Sdr => "sdr",
            DynamicRange::Hdr => "hdr",
        }
    }
}

impl fmt::Display for DynamicRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Video formats of one dynamic range with their extremes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DynamicRangeGroup {
    pub highest: Option<CleanedVideoFormat>,
    pub lowest: Option<CleanedVideoFormat>,
    pub combined: Vec<CleanedVideoFormat>,
}

impl DynamicRangeGroup {
    pub fn is_empty(&self) -> bool {
        self.combined.is_empty()
    }
}

/// Video-only formats split by dynamic range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoOnly {
    /// SDR formats
    pub standard: DynamicRangeGroup,
    /// HDR formats
    pub hdr: DynamicRangeGroup,
}

impl VideoOnly {
    pub fn group(&self, range: DynamicRange) -> &DynamicRangeGroup {
        match range {
            DynamicRange::Sdr => &self.standard,
            DynamicRange::Hdr => &self.hdr,
        }
    }
}
