//! Bounded-concurrency segment downloads.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use super::manifest::{parse_manifest, SegmentManifest};
use crate::config::DEFAULT_SEGMENT_CONCURRENCY;
use crate::error::{CoreError, CoreResult};
use crate::metrics;

/// Segment completion counter handed to progress callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentProgress {
    pub completed: usize,
    pub total: usize,
}

impl SegmentProgress {
    /// Completed share in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// File name for the segment at `index`.
pub fn segment_file_name(index: usize) -> String {
    format!("segment_{:05}.ts", index)
}

/// Downloads manifests and their segments over plain HTTP GET.
#[derive(Debug, Clone)]
pub struct SegmentFetcher {
    client: reqwest::Client,
    concurrency: usize,
}

impl Default for SegmentFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_CONCURRENCY)
    }
}

impl SegmentFetcher {
    pub fn new(concurrency: usize) -> Self {
        Self::with_client(reqwest::Client::new(), concurrency)
    }

    pub fn with_client(client: reqwest::Client, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// GET the manifest and parse it relative to its own URL.
    pub async fn fetch_manifest(&self, manifest_url: &str) -> CoreResult<SegmentManifest> {
        let url = Url::parse(manifest_url)
            .map_err(|e| CoreError::InvalidUrl(format!("{}: {}", manifest_url, e)))?;

        let body = self.get(&url).await?;
        let text = String::from_utf8(body)
            .map_err(|e| CoreError::ManifestParse(format!("manifest is not UTF-8: {}", e)))?;

        let manifest = parse_manifest(&text, &url)?;
        debug!(url = %url, segments = manifest.len(), "Parsed manifest");
        Ok(manifest)
    }

    /// Download every segment into `dir`, returning paths in manifest order.
    ///
    /// At most `concurrency` transfers run at once. All scheduled downloads
    /// resolve before the first failure (in manifest order) is returned.
    pub async fn download_all<F>(
        &self,
        manifest: &SegmentManifest,
        dir: &Path,
        on_progress: F,
    ) -> CoreResult<Vec<PathBuf>>
    where
        F: Fn(SegmentProgress) + Send + Sync,
    {
        let total = manifest.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let completed = AtomicUsize::new(0);

        info!(segments = total, concurrency = self.concurrency, "Downloading segments");

        let tasks = manifest.segments.iter().enumerate().map(|(index, url)| {
            let semaphore = Arc::clone(&semaphore);
            let path = dir.join(segment_file_name(index));
            let completed = &completed;
            let on_progress = &on_progress;
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| CoreError::segment_transfer(url.as_str(), e))?;

                match self.download_one(url, &path).await {
                    Ok(bytes) => {
                        metrics::record_segment_downloaded();
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        debug!(index, bytes, "Segment downloaded");
                        on_progress(SegmentProgress {
                            completed: done,
                            total,
                        });
                        Ok(path)
                    }
                    Err(e) => {
                        metrics::record_segment_failure();
                        warn!(index, url = %url, "Segment download failed: {}", e);
                        Err(e)
                    }
                }
            }
        });

        join_all(tasks).await.into_iter().collect()
    }

    async fn download_one(&self, url: &Url, path: &Path) -> CoreResult<usize> {
        let body = self.get(url).await?;
        tokio::fs::write(path, &body)
            .await
            .map_err(|e| CoreError::segment_transfer(url.as_str(), e))?;
        Ok(body.len())
    }

    async fn get(&self, url: &Url) -> CoreResult<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CoreError::segment_transfer(url.as_str(), e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| CoreError::segment_transfer(url.as_str(), e))?;
        Ok(body.to_vec())
    }
}
