//! Error types for extraction and stream assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// How a caller should present an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing tool or unusable extractor output: fix the setup.
    Configuration,
    /// Process, network or disk failure that survived the retry policy.
    Transient,
    /// The requested format category is empty.
    NotFound,
    /// Anything else.
    Internal,
}

/// Errors that can occur in the extraction core.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{tool} not found")]
    ToolNotFound { tool: String },

    #[error("Extractor invocation failed: {message}")]
    InvocationFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Extractor failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Proxy helper failed to bootstrap: {0}")]
    ProxyBootstrap(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("No {category} formats found")]
    FormatNotFound { category: String },

    #[error("Segment transfer failed for {url}: {message}")]
    SegmentTransfer { url: String, message: String },

    #[error("Segment merge failed at {}: {message}", path.display())]
    Merge { path: PathBuf, message: String },

    #[error("Transcoder failed: {message}")]
    TranscodeFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a tool-not-found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create an extractor invocation failure.
    pub fn invocation_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::InvocationFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a classification gap error.
    pub fn format_not_found(category: impl Into<String>) -> Self {
        Self::FormatNotFound {
            category: category.into(),
        }
    }

    /// Create a segment transfer failure.
    pub fn segment_transfer(url: impl Into<String>, message: impl ToString) -> Self {
        Self::SegmentTransfer {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a merge failure.
    pub fn merge(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Merge {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a transcoder failure.
    pub fn transcode_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::TranscodeFailed {
            message: message.into(),
            exit_code,
        }
    }

    /// Whether the extractor retry policy applies to this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::InvocationFailed { .. } | CoreError::Timeout(_) | CoreError::Io(_)
        )
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::ToolNotFound { .. }
            | CoreError::Parse(_)
            | CoreError::ManifestParse(_)
            | CoreError::InvalidUrl(_) => ErrorCategory::Configuration,
            CoreError::InvocationFailed { .. }
            | CoreError::RetriesExhausted { .. }
            | CoreError::Timeout(_)
            | CoreError::ProxyBootstrap(_)
            | CoreError::SegmentTransfer { .. }
            | CoreError::Merge { .. }
            | CoreError::TranscodeFailed { .. } => ErrorCategory::Transient,
            CoreError::FormatNotFound { .. } => ErrorCategory::NotFound,
            CoreError::Io(_) => ErrorCategory::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            CoreError::tool_not_found("yt-dlp").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            CoreError::segment_transfer("https://a/b.ts", "404").category(),
            ErrorCategory::Transient
        );
        assert_eq!(
            CoreError::format_not_found("audio/fr").category(),
            ErrorCategory::NotFound
        );
    }

    #[test]
    fn test_only_invocation_errors_retry() {
        assert!(CoreError::invocation_failed("exit 1", None, Some(1)).is_retryable());
        assert!(CoreError::Timeout(5).is_retryable());
        assert!(!CoreError::tool_not_found("yt-dlp").is_retryable());
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!CoreError::Parse(parse).is_retryable());
    }
}
