//! Extraction and stream assembly core for ytdlx.
//!
//! This crate provides:
//! - Retry-guarded extractor invocation with an optional proxy helper
//! - Classification of raw format lists into language and dynamic-range groups
//! - HLS manifest parsing, bounded-concurrency segment download and merge
//! - Transcoder sessions that callers configure through a single hook

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod hls;
pub mod locator;
pub mod metrics;
pub mod retry;
pub mod select;
pub mod session;
pub mod source;
pub mod transcode;
pub mod workdir;

pub use classify::{classify, classify_json};
pub use config::{CoreConfig, ProxyConfig};
pub use error::{CoreError, CoreResult, ErrorCategory};
pub use extract::{ExtractionClient, ProcessRunner, ProxyHelper, TokioProcessRunner};
pub use hls::{merge_segments, parse_manifest, SegmentFetcher, SegmentManifest, SegmentProgress};
pub use locator::ToolPaths;
pub use retry::{retry_async, retry_async_if, RetryConfig, RetryResult};
pub use session::{SessionBuilder, SessionConfigurator, SessionOutcome, SessionRequest};
pub use source::MediaSource;
pub use transcode::{OutputTarget, PipedTranscode, TranscodeProgress, TranscodeSession};
pub use workdir::WorkDir;
