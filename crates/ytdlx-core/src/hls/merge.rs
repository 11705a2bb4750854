//! Sequential segment concatenation.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::metrics;

/// Concatenate `segments` into `output` strictly in slice order.
///
/// Returns the number of bytes written.
pub async fn merge_segments(segments: &[PathBuf], output: &Path) -> CoreResult<u64> {
    let mut out = File::create(output)
        .await
        .map_err(|e| CoreError::merge(output, e))?;

    let mut total = 0u64;
    for segment in segments {
        let mut input = File::open(segment)
            .await
            .map_err(|e| CoreError::merge(segment, e))?;
        total += tokio::io::copy(&mut input, &mut out)
            .await
            .map_err(|e| CoreError::merge(output, e))?;
    }

    out.flush().await.map_err(|e| CoreError::merge(output, e))?;

    metrics::record_merged_bytes(total);
    info!(
        segments = segments.len(),
        bytes = total,
        output = %output.display(),
        "Merged segments"
    );
    Ok(total)
}
