//! Anonymizing proxy helper lifecycle.
//!
//! The helper is started with a single flag and considered usable once a line
//! of its combined stdout/stderr contains the bootstrap marker. The readers keep
//! draining both pipes after that so the helper never blocks on a full pipe.

use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ProxyConfig;
use crate::error::{CoreError, CoreResult};

/// A running, bootstrapped proxy helper.
///
/// Killed by [`ProxyHelper::shutdown`], or on drop as a fallback.
#[derive(Debug)]
pub struct ProxyHelper {
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

impl ProxyHelper {
    /// Start the helper and wait for its bootstrap marker.
    pub async fn spawn(program: &Path, config: &ProxyConfig) -> CoreResult<Self> {
        debug!("Starting proxy helper: {} {}", program.display(), config.flag);

        let mut child = Command::new(program)
            .arg(&config.flag)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CoreError::ProxyBootstrap(format!("failed to spawn {}: {}", program.display(), e))
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        let waited = tokio::time::timeout(
            config.bootstrap_timeout,
            wait_for_marker(&mut rx, &config.bootstrap_marker),
        )
        .await;

        let failure = match waited {
            Ok(Ok(())) => {
                info!(address = %config.address, "Proxy helper bootstrapped");
                return Ok(Self { child, readers });
            }
            Ok(Err(e)) => e,
            Err(_) => CoreError::ProxyBootstrap(format!(
                "no bootstrap marker within {} seconds",
                config.bootstrap_timeout.as_secs()
            )),
        };

        let helper = Self { child, readers };
        helper.shutdown().await;
        Err(failure)
    }

    /// Kill the helper and stop draining its output.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill proxy helper: {}", e);
        } else {
            debug!("Proxy helper stopped");
        }
        for reader in self.readers.drain(..) {
            reader.abort();
        }
    }
}

fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            // The receiver is gone once bootstrapped; keep reading anyway.
            let _ = tx.send(line);
        }
    })
}

/// Resolve on the first line containing `marker`.
///
/// Fails when every sender is dropped before the marker shows up.
pub(crate) async fn wait_for_marker(
    lines: &mut mpsc::UnboundedReceiver<String>,
    marker: &str,
) -> CoreResult<()> {
    while let Some(line) = lines.recv().await {
        debug!(target: "ytdlx::proxy", "{}", line);
        if line.contains(marker) {
            return Ok(());
        }
    }
    Err(CoreError::ProxyBootstrap(
        "helper output closed before bootstrap completed".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BOOTSTRAP_MARKER;
    use std::time::Duration;

    #[tokio::test]
    async fn test_marker_found_mid_stream() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send("Nov 01 [notice] Bootstrapped 45% (loading_descriptors)".to_string())
            .unwrap();
        tx.send("Nov 01 [notice] Bootstrapped 100% (done): Done".to_string())
            .unwrap();

        wait_for_marker(&mut rx, DEFAULT_BOOTSTRAP_MARKER)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_closed_stream_rejects() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send("Nov 01 [warn] Could not bind to 127.0.0.1:9050".to_string())
            .unwrap();
        drop(tx);

        let err = wait_for_marker(&mut rx, DEFAULT_BOOTSTRAP_MARKER)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ProxyBootstrap(_)));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use tempfile::TempDir;

        // The helper flag carries the script path and /bin/sh is the program.
        fn config(dir: &TempDir, body: &str, timeout: Duration) -> ProxyConfig {
            let path = dir.path().join("helper.sh");
            std::fs::write(&path, body).unwrap();
            ProxyConfig {
                flag: path.to_string_lossy().into_owned(),
                bootstrap_timeout: timeout,
                ..Default::default()
            }
        }

        #[tokio::test]
        async fn test_spawn_waits_for_marker_on_stderr() {
            let dir = TempDir::new().unwrap();
            let config = config(
                &dir,
                "echo starting\necho 'Nov 01 [notice] Bootstrapped 100% (done): Done' >&2\nexec sleep 30\n",
                Duration::from_secs(10),
            );

            let helper = ProxyHelper::spawn(Path::new("/bin/sh"), &config)
                .await
                .unwrap();
            helper.shutdown().await;
        }

        #[tokio::test]
        async fn test_spawn_rejects_when_helper_exits() {
            let dir = TempDir::new().unwrap();
            let config = config(&dir, "echo 'bind failed' >&2\nexit 1\n", Duration::from_secs(10));

            let err = ProxyHelper::spawn(Path::new("/bin/sh"), &config)
                .await
                .unwrap_err();
            assert!(matches!(err, CoreError::ProxyBootstrap(_)));
        }

        #[tokio::test]
        async fn test_spawn_times_out() {
            let dir = TempDir::new().unwrap();
            let config = config(&dir, "exec sleep 30\n", Duration::from_millis(200));

            let err = ProxyHelper::spawn(Path::new("/bin/sh"), &config)
                .await
                .unwrap_err();
            assert!(err.to_string().contains("no bootstrap marker"));
        }
    }
}
