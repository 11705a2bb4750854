//! Extractor argument template.

use std::path::Path;

/// Per-call switches appended to the fixed template.
#[derive(Debug, Clone, Default)]
pub struct ExtractorOptions<'a> {
    pub user_agent: &'a str,
    /// Proxy address, set when routing through the proxy helper
    pub proxy: Option<&'a str>,
    /// Transcoder path, when known
    pub ffmpeg_location: Option<&'a Path>,
    pub verbose: bool,
}

/// Build the extractor argument list for one video URL.
pub fn build_extractor_args(url: &str, options: &ExtractorOptions<'_>) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--dump-single-json".into(),
        "--no-check-certificates".into(),
        "--skip-download".into(),
        "--user-agent".into(),
        options.user_agent.to_string(),
        "--no-warnings".into(),
    ];

    if let Some(proxy) = options.proxy {
        args.push("--proxy".into());
        args.push(proxy.to_string());
    }

    if let Some(path) = options.ffmpeg_location {
        args.push("--ffmpeg-location".into());
        args.push(path.to_string_lossy().into_owned());
    }

    if options.verbose {
        args.push("--verbose".into());
    }

    args.push(url.to_string());
    args
}
