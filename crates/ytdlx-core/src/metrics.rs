//! Metrics for extraction and segment staging.
//!
//! No recorder is installed here; without one the macros are no-ops.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const EXTRACTOR_ATTEMPTS_TOTAL: &str = "ytdlx_extractor_attempts_total";
    pub const EXTRACTION_DURATION_SECONDS: &str = "ytdlx_extraction_duration_seconds";
    pub const SEGMENTS_DOWNLOADED_TOTAL: &str = "ytdlx_segments_downloaded_total";
    pub const SEGMENT_FAILURES_TOTAL: &str = "ytdlx_segment_failures_total";
    pub const MERGED_BYTES_TOTAL: &str = "ytdlx_merged_bytes_total";
}

/// Record one extractor attempt.
pub fn record_extractor_attempt(outcome: &'static str) {
    counter!(names::EXTRACTOR_ATTEMPTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a complete extraction call.
pub fn record_extraction(success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "failure" };
    histogram!(names::EXTRACTION_DURATION_SECONDS, "status" => status).record(duration_secs);
}

/// Record one downloaded segment.
pub fn record_segment_downloaded() {
    counter!(names::SEGMENTS_DOWNLOADED_TOTAL).increment(1);
}

/// Record one failed segment transfer.
pub fn record_segment_failure() {
    counter!(names::SEGMENT_FAILURES_TOTAL).increment(1);
}

/// Record bytes written by a merge.
pub fn record_merged_bytes(bytes: u64) {
    counter!(names::MERGED_BYTES_TOTAL).increment(bytes);
}
