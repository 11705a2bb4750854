//! Shared data models for the ytdlx extraction core.
//!
//! This crate provides Serde-serializable types for:
//! - Raw extractor output (formats, thumbnails, top-level record)
//! - Cleaned audio/video formats with domain fields only
//! - Language and dynamic-range groups with highest/lowest representatives
//! - The assembled extraction result handed to callers
//! - Canonical video URL handling

pub mod format;
pub mod group;
pub mod metadata;
pub mod result;
pub mod thumbnail;
pub mod utils;

// Re-export common types
pub use format::{CleanedAudioFormat, CleanedVideoFormat, RawFormat};
pub use group::{AudioOnly, DynamicRange, DynamicRangeGroup, LanguageGroup, VideoOnly};
pub use metadata::{MetaData, RawVideoInfo};
pub use result::ExtractionResult;
pub use thumbnail::{RawThumbnail, ThumbnailEntry, Thumbnails};
pub use utils::{canonical_video_url, extract_video_id, VideoUrlError};
