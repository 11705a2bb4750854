//! Retry-guarded extractor client.

use regex::Regex;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn};
use ytdlx_models::ExtractionResult;

use super::args::{build_extractor_args, ExtractorOptions};
use super::proxy::ProxyHelper;
use super::runner::{ProcessOutput, ProcessRunner, TokioProcessRunner};
use crate::classify::classify_json;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::locator::{ToolPaths, EXTRACTOR, TRANSCODER};
use crate::metrics;
use crate::retry::{retry_async_if, RetryResult};

/// Name substituted for the upstream extractor name in its output.
pub const PRODUCT_NAME: &str = "yt-dlx";

static UPSTREAM_NAME: OnceLock<Regex> = OnceLock::new();

/// Replace every occurrence of the upstream tool name, any case.
pub fn rewrite_tool_name(text: &str) -> String {
    let re = UPSTREAM_NAME
        .get_or_init(|| Regex::new(r"(?i)yt-dlp").expect("valid upstream name pattern"));
    re.replace_all(text, PRODUCT_NAME).into_owned()
}

/// Invokes the metadata extractor for one video at a time.
///
/// Every call spawns its own extractor process (and proxy helper when asked
/// to), so concurrent calls share nothing but the tool paths.
pub struct ExtractionClient {
    tools: ToolPaths,
    config: CoreConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl ExtractionClient {
    pub fn new(tools: ToolPaths, config: CoreConfig) -> Self {
        let runner = Arc::new(TokioProcessRunner::new(config.attempt_timeout));
        Self {
            tools,
            config,
            runner,
        }
    }

    /// Replace the process runner.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    /// Run the extractor and return its JSON output with the tool name rewritten.
    ///
    /// The whole invocation is retried on spawn failure, non-zero exit or
    /// timeout. Output is never parsed here.
    pub async fn fetch_raw(&self, url: &str, use_proxy: bool) -> CoreResult<String> {
        let start = Instant::now();
        let result = self.fetch_raw_inner(url, use_proxy).await;
        metrics::record_extraction(result.is_ok(), start.elapsed().as_secs_f64());
        result
    }

    async fn fetch_raw_inner(&self, url: &str, use_proxy: bool) -> CoreResult<String> {
        let extractor = self.tools.require(EXTRACTOR)?;

        let proxy = if use_proxy {
            let program = self.tools.require(&self.config.proxy.tool)?;
            Some(ProxyHelper::spawn(program, &self.config.proxy).await?)
        } else {
            None
        };

        let args = build_extractor_args(
            url,
            &ExtractorOptions {
                user_agent: &self.config.user_agent,
                proxy: proxy.as_ref().map(|_| self.config.proxy.address.as_str()),
                ffmpeg_location: self.tools.get(TRANSCODER),
                verbose: self.config.verbose,
            },
        );

        info!(url = %url, proxy = use_proxy, "Running extractor");

        let result = retry_async_if(
            &self.config.retry,
            || self.attempt(extractor, &args),
            CoreError::is_retryable,
        )
        .await;

        if let Some(helper) = proxy {
            helper.shutdown().await;
        }

        match result {
            RetryResult::Success(output) => {
                debug!(bytes = output.stdout.len(), "Extractor finished");
                Ok(rewrite_tool_name(&output.stdout))
            }
            RetryResult::Failed { error, attempts } if error.is_retryable() => {
                warn!(url = %url, attempts, "Extractor failed: {}", error);
                Err(CoreError::RetriesExhausted {
                    attempts,
                    last_error: error.to_string(),
                })
            }
            RetryResult::Failed { error, .. } => Err(error),
        }
    }

    async fn attempt(&self, program: &Path, args: &[String]) -> CoreResult<ProcessOutput> {
        let result = self.runner.run(program, args).await;
        metrics::record_extractor_attempt(if result.is_ok() { "success" } else { "failure" });
        result
    }

    /// Fetch, parse and classify in one call.
    ///
    /// Classification runs once on the final output, after any retries.
    pub async fn extract(&self, url: &str, use_proxy: bool) -> CoreResult<ExtractionResult> {
        let raw = self.fetch_raw(url, use_proxy).await?;
        let result = classify_json(&raw)?;
        info!(
            url = %url,
            languages = result.audio_only.standard.len(),
            thumbnails = result.thumbnails.all.len(),
            "Extraction classified"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryConfig;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration;

    const DOC: &str = r#"{
        "id": "dQw4w9WgXcQ",
        "title": "Made with yt-dlp",
        "formats": [
            {"format_id": "140", "format_note": "English original, medium", "resolution": "audio only"}
        ]
    }"#;

    /// Replays a fixed sequence of attempt outcomes and records every call.
    struct ScriptedRunner {
        outcomes: Mutex<Vec<CoreResult<ProcessOutput>>>,
        calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
    }

    impl ScriptedRunner {
        fn new(mut outcomes: Vec<CoreResult<ProcessOutput>>) -> Arc<Self> {
            outcomes.reverse();
            Arc::new(Self {
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for ScriptedRunner {
        async fn run(&self, program: &Path, args: &[String]) -> CoreResult<ProcessOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_path_buf(), args.to_vec()));
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(CoreError::invocation_failed("no more outcomes", None, None)))
        }
    }

    fn ok(stdout: &str) -> CoreResult<ProcessOutput> {
        Ok(ProcessOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    fn exit_failure() -> CoreResult<ProcessOutput> {
        Err(CoreError::invocation_failed("HTTP Error 429", None, Some(1)))
    }

    fn client(tools: ToolPaths, runner: Arc<ScriptedRunner>) -> ExtractionClient {
        let config = CoreConfig {
            retry: RetryConfig::new("extractor")
                .with_delays(Duration::from_millis(1), Duration::from_millis(4)),
            ..Default::default()
        };
        ExtractionClient::new(tools, config).with_runner(runner)
    }

    fn tools() -> ToolPaths {
        ToolPaths::new().with(EXTRACTOR, "/opt/bin/yt-dlp")
    }

    #[tokio::test]
    async fn test_succeeds_on_third_attempt() {
        let runner = ScriptedRunner::new(vec![exit_failure(), exit_failure(), ok(DOC), ok(DOC)]);
        let client = client(tools(), runner.clone());

        let raw = client.fetch_raw("URL", false).await.unwrap();

        assert!(raw.contains("Made with yt-dlx"));
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries() {
        let runner = ScriptedRunner::new(vec![
            exit_failure(),
            exit_failure(),
            exit_failure(),
            exit_failure(),
            ok(DOC),
        ]);
        let client = client(tools(), runner.clone());

        let err = client.fetch_raw("URL", false).await.unwrap_err();

        match err {
            CoreError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert!(last_error.contains("HTTP Error 429"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_missing_extractor_makes_no_attempt() {
        let runner = ScriptedRunner::new(vec![ok(DOC)]);
        let client = client(ToolPaths::new(), runner.clone());

        let err = client.extract("URL", false).await.unwrap_err();

        assert!(matches!(err, CoreError::ToolNotFound { ref tool } if tool == "yt-dlp"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_proxy_helper_makes_no_attempt() {
        let runner = ScriptedRunner::new(vec![ok(DOC)]);
        let client = client(tools(), runner.clone());

        let err = client.fetch_raw("URL", true).await.unwrap_err();

        assert!(matches!(err, CoreError::ToolNotFound { ref tool } if tool == "tor"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_passes_transcoder_location() {
        let runner = ScriptedRunner::new(vec![ok(DOC)]);
        let client = client(
            tools().with(TRANSCODER, "/opt/bin/ffmpeg"),
            runner.clone(),
        );

        client.fetch_raw("https://youtu.be/x", false).await.unwrap();

        let calls = runner.calls();
        let (program, args) = &calls[0];
        assert_eq!(program, Path::new("/opt/bin/yt-dlp"));
        let pos = args.iter().position(|a| a == "--ffmpeg-location").unwrap();
        assert_eq!(args[pos + 1], "/opt/bin/ffmpeg");
        assert!(!args.contains(&"--proxy".to_string()));
        assert_eq!(args.last().unwrap(), "https://youtu.be/x");
    }

    #[tokio::test]
    async fn test_parse_failure_is_not_retried() {
        let runner = ScriptedRunner::new(vec![ok("{\"id\": "), ok(DOC)]);
        let client = client(tools(), runner.clone());

        let err = client.extract("URL", false).await.unwrap_err();

        assert!(matches!(err, CoreError::Parse(_)));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_extract_classifies() {
        let runner = ScriptedRunner::new(vec![ok(DOC)]);
        let client = client(tools(), runner);

        let result = client.extract("URL", false).await.unwrap();

        assert_eq!(result.meta_data.title.as_deref(), Some("Made with yt-dlx"));
        assert_eq!(
            result.audio_only.language("English", false).unwrap().highest.format_id,
            "140"
        );
    }

    #[test]
    fn test_rewrite_tool_name() {
        assert_eq!(
            rewrite_tool_name("YT-DLP and yt-dlp, not ytdlp"),
            "yt-dlx and yt-dlx, not ytdlp"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_proxy_address_added_and_helper_stopped() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("tor.sh");
        std::fs::write(
            &script,
            "echo 'Nov 01 [notice] Bootstrapped 100% (done): Done'\nexec sleep 30\n",
        )
        .unwrap();

        let runner = ScriptedRunner::new(vec![ok(DOC)]);
        let mut client = client(tools().with("tor", "/bin/sh"), runner.clone());
        client.config.proxy.flag = script.to_string_lossy().into_owned();

        client.fetch_raw("URL", true).await.unwrap();

        let calls = runner.calls();
        let args = &calls[0].1;
        let pos = args.iter().position(|a| a == "--proxy").unwrap();
        assert_eq!(args[pos + 1], "socks5://127.0.0.1:9050");
    }
}
