//! Executable path lookup.
//!
//! The core only consumes a name to path mapping. [`ToolPaths::discover`]
//! fills one from environment overrides and `PATH`, and [`ToolPaths::cached`]
//! keeps the first discovery for the life of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Metadata extractor.
pub const EXTRACTOR: &str = "yt-dlp";
/// Transcoder.
pub const TRANSCODER: &str = "ffmpeg";
/// Anonymizing proxy helper.
pub const PROXY: &str = "tor";

/// Tools resolved by [`ToolPaths::discover`].
pub const KNOWN_TOOLS: [&str; 3] = [EXTRACTOR, TRANSCODER, PROXY];

static CACHED: OnceLock<ToolPaths> = OnceLock::new();

/// Resolved executable paths by tool name.
#[derive(Debug, Clone, Default)]
pub struct ToolPaths {
    paths: HashMap<String, PathBuf>,
}

impl ToolPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a tool path.
    pub fn with(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.insert(name, path);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.paths.insert(name.into(), path.into());
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.paths.get(name).map(PathBuf::as_path)
    }

    /// Path for `name`, or [`CoreError::ToolNotFound`].
    pub fn require(&self, name: &str) -> CoreResult<&Path> {
        self.get(name).ok_or_else(|| CoreError::tool_not_found(name))
    }

    /// Names with a resolved path, sorted.
    pub fn resolved(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.paths.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve every known tool from `YTDLX_<NAME>_PATH` or `PATH`.
    pub fn discover() -> Self {
        let mut tools = Self::new();
        for name in KNOWN_TOOLS {
            if let Some(path) = locate(name) {
                debug!(tool = name, path = %path.display(), "Resolved tool");
                tools.insert(name, path);
            } else {
                debug!(tool = name, "Tool not found");
            }
        }
        tools
    }

    /// Process-wide discovery result, populated on first use.
    pub fn cached() -> &'static ToolPaths {
        CACHED.get_or_init(Self::discover)
    }
}

/// Environment variable that overrides the lookup for `name`.
pub fn override_var(name: &str) -> String {
    format!(
        "YTDLX_{}_PATH",
        name.to_uppercase().replace(['-', '.'], "_")
    )
}

fn locate(name: &str) -> Option<PathBuf> {
    if let Ok(path) = std::env::var(override_var(name)) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_tool() {
        let tools = ToolPaths::new().with(TRANSCODER, "/usr/bin/ffmpeg");

        assert_eq!(tools.require(TRANSCODER).unwrap(), Path::new("/usr/bin/ffmpeg"));
        let err = tools.require(EXTRACTOR).unwrap_err();
        assert!(matches!(err, CoreError::ToolNotFound { ref tool } if tool == "yt-dlp"));
    }

    #[test]
    fn test_override_var_name() {
        assert_eq!(override_var("yt-dlp"), "YTDLX_YT_DLP_PATH");
        assert_eq!(override_var("ffmpeg"), "YTDLX_FFMPEG_PATH");
    }

    #[test]
    fn test_resolved_is_sorted() {
        let tools = ToolPaths::new()
            .with(PROXY, "/usr/bin/tor")
            .with(EXTRACTOR, "/usr/bin/yt-dlp");
        assert_eq!(tools.resolved(), vec!["tor", "yt-dlp"]);
    }
}
