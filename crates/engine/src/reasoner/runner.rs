use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;

use triage_common::config::ReasonerConfig;
use triage_common::{Result, TriageError};

/// Runs the reasoner binary as a subprocess against a generated script and
/// captures its fact dump.
///
/// Both temp files are owned `NamedTempFile`s, so they are deleted on every
/// exit path — success, non-zero exit, timeout, or early `?` return.
pub struct ReasonerRunner {
    config: ReasonerConfig,
}

impl ReasonerRunner {
    pub fn new(config: ReasonerConfig) -> Self {
        Self { config }
    }

    /// Cheap liveness probe: version flag with a short timeout. Gates every
    /// inference attempt; deliberately not cached across calls.
    pub async fn probe(&self) -> bool {
        let spawned = Command::new(&self.config.command)
            .arg("-v")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(_) => return false,
        };

        let probe_timeout = Duration::from_secs(self.config.probe_timeout_seconds);
        match tokio::time::timeout(probe_timeout, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(_)) => false,
            Err(_) => {
                let _ = child.start_kill();
                false
            }
        }
    }

    /// Executes one script run. Returns the raw output on success.
    pub async fn run_script(&self, script: &str) -> Result<String> {
        let script_file = NamedTempFile::new().map_err(|e| {
            TriageError::ReasonerUnavailable(format!("cannot create script file: {}", e))
        })?;
        std::fs::write(script_file.path(), script).map_err(|e| {
            TriageError::ReasonerUnavailable(format!("cannot write script file: {}", e))
        })?;

        let output_file = NamedTempFile::new().map_err(|e| {
            TriageError::ReasonerUnavailable(format!("cannot create output file: {}", e))
        })?;
        let output_handle = output_file.reopen().map_err(|e| {
            TriageError::ReasonerUnavailable(format!("cannot reopen output file: {}", e))
        })?;

        let mut child = Command::new(&self.config.command)
            .arg("-f")
            .arg(script_file.path())
            .stdout(Stdio::from(output_handle))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                TriageError::ReasonerUnavailable(format!(
                    "cannot spawn '{}': {}",
                    self.config.command, e
                ))
            })?;

        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(waited) => waited.map_err(|e| {
                TriageError::ReasonerUnavailable(format!("wait failed: {}", e))
            })?,
            Err(_) => {
                // Forced termination; nothing is propagated into the child
                // other than this.
                let _ = child.start_kill();
                let _ = child.wait().await;
                metrics::counter!("reasoner.timeouts").increment(1);
                return Err(TriageError::ReasonerTimeout(self.config.timeout_seconds));
            }
        };

        if !status.success() {
            let partial = std::fs::read_to_string(output_file.path()).unwrap_or_default();
            return Err(TriageError::ReasonerUnavailable(format!(
                "exit {}: {}",
                status.code().unwrap_or(-1),
                partial.chars().take(200).collect::<String>()
            )));
        }

        std::fs::read_to_string(output_file.path()).map_err(|e| {
            TriageError::ReasonerUnavailable(format!("cannot read output file: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(command: &str, timeout_seconds: u64) -> ReasonerConfig {
        ReasonerConfig {
            command: command.to_string(),
            timeout_seconds,
            probe_timeout_seconds: 2,
            ..ReasonerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_probe_fails_for_missing_binary() {
        let runner = ReasonerRunner::new(config("definitely-not-a-real-binary", 5));
        assert!(!runner.probe().await);
    }

    #[tokio::test]
    async fn test_run_script_missing_binary_is_unavailable() {
        let runner = ReasonerRunner::new(config("definitely-not-a-real-binary", 5));
        let err = runner.run_script("(exit)").await.unwrap_err();
        assert!(err.is_reasoner());
        assert!(matches!(err, TriageError::ReasonerUnavailable(_)));
    }

    #[tokio::test]
    async fn test_run_script_times_out_and_kills() {
        // sh stands in for a hung reasoner: "sh -f <script>" executes the
        // script file, which sleeps far past the timeout.
        let runner = ReasonerRunner::new(config("sh", 1));
        let err = runner.run_script("sleep 30").await.unwrap_err();
        assert!(matches!(err, TriageError::ReasonerTimeout(1)));
    }

    #[tokio::test]
    async fn test_run_script_captures_output() {
        let runner = ReasonerRunner::new(config("sh", 5));
        let output = runner
            .run_script("echo '(decision (tipo diy))'")
            .await
            .unwrap();
        assert!(output.contains("(decision (tipo diy))"));
    }
}
