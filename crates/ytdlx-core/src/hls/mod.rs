//! HLS manifest parsing, segment download and reassembly.

mod fetch;
mod manifest;
mod merge;

pub use fetch::{segment_file_name, SegmentFetcher, SegmentProgress};
pub use manifest::{parse_manifest, SegmentManifest};
pub use merge::merge_segments;
