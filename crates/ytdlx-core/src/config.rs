//! Core configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryConfig;

/// Browser user agent passed to the extractor.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Line fragment the proxy helper prints once its circuit is usable.
pub const DEFAULT_BOOTSTRAP_MARKER: &str = "Bootstrapped 100% (done): Done";

/// Local SOCKS address exposed by the proxy helper.
pub const DEFAULT_PROXY_ADDRESS: &str = "socks5://127.0.0.1:9050";

/// Simultaneous segment transfers per staging run.
pub const DEFAULT_SEGMENT_CONCURRENCY: usize = 5;

/// Anonymizing proxy helper settings.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Tool name looked up in the tool paths
    pub tool: String,
    /// The single flag the helper is started with
    pub flag: String,
    /// Bootstrap-complete marker searched for in the helper output
    pub bootstrap_marker: String,
    /// Proxy address handed to the extractor
    pub address: String,
    /// Upper bound on waiting for the marker
    pub bootstrap_timeout: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            tool: crate::locator::PROXY.to_string(),
            flag: "--ignore-missing-torrc".to_string(),
            bootstrap_marker: DEFAULT_BOOTSTRAP_MARKER.to_string(),
            address: DEFAULT_PROXY_ADDRESS.to_string(),
            bootstrap_timeout: Duration::from_secs(60),
        }
    }
}

impl ProxyConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            flag: std::env::var("YTDLX_PROXY_FLAG").unwrap_or(defaults.flag),
            address: std::env::var("YTDLX_PROXY_ADDRESS").unwrap_or(defaults.address),
            bootstrap_timeout: std::env::var("YTDLX_PROXY_BOOTSTRAP_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.bootstrap_timeout),
            ..defaults
        }
    }
}

/// Configuration shared by the extraction client and the session builder.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Retry policy for extractor invocations
    pub retry: RetryConfig,
    /// Wall-clock bound on one extractor attempt
    pub attempt_timeout: Option<Duration>,
    /// Maximum concurrent segment downloads
    pub segment_concurrency: usize,
    /// Parent directory for per-run working directories
    pub work_root: PathBuf,
    /// User agent passed to the extractor
    pub user_agent: String,
    /// Pass `--verbose` to the extractor
    pub verbose: bool,
    /// Proxy helper settings
    pub proxy: ProxyConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::new("extractor"),
            attempt_timeout: Some(Duration::from_secs(120)),
            segment_concurrency: DEFAULT_SEGMENT_CONCURRENCY,
            work_root: std::env::temp_dir().join("ytdlx"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            verbose: false,
            proxy: ProxyConfig::default(),
        }
    }
}

impl CoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            retry: RetryConfig::from_env("extractor"),
            attempt_timeout: match std::env::var("YTDLX_ATTEMPT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(0) => None,
                Some(secs) => Some(Duration::from_secs(secs)),
                None => defaults.attempt_timeout,
            },
            segment_concurrency: std::env::var("YTDLX_SEGMENT_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.segment_concurrency),
            work_root: std::env::var("YTDLX_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_root),
            user_agent: std::env::var("YTDLX_USER_AGENT").unwrap_or(defaults.user_agent),
            verbose: std::env::var("YTDLX_VERBOSE")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            proxy: ProxyConfig::from_env(),
        }
    }
}
