//! Per-run working directories.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreResult;

/// A uniquely named directory owned by one staging run.
///
/// Not removed on drop; call [`WorkDir::cleanup`].
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Create `<root>/ytdlx-<uuid>`, creating `root` as needed.
    pub async fn create(root: impl AsRef<Path>) -> CoreResult<Self> {
        let path = root.as_ref().join(format!("ytdlx-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).await?;
        debug!(path = %path.display(), "Created working directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the directory and its contents. Failures are logged only.
    pub async fn cleanup(self) {
        match fs::remove_dir_all(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "Removed working directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                "Failed to remove working directory: {}", e
            ),
        }
    }
}
