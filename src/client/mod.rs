//! Command executor and liveness probe for `emacsclient`.
//!
//! Every transport goes through [`Executor`]: it probes the Emacs server,
//! runs the script through a [`ClientRunner`] and maps the outcome onto
//! [`BridgeError`]. Each `execute` costs two client runs (probe + script),
//! and nothing is retried.

pub mod escape;
pub mod runner;

use tracing::{debug, error, info, warn};

pub use runner::{ClientOutput, ClientRunner, ProcessRunner};

use crate::config::{ClientConfig, StderrPolicy};
use crate::error::{BridgeError, BridgeResult};

/// Side-effect-free script used by the liveness probe.
pub const PROBE_SCRIPT: &str = "(+ 1 2)";

/// Runs scripts against a running Emacs server.
#[derive(Debug, Clone)]
pub struct Executor<R = ProcessRunner> {
    runner: R,
    stderr_policy: StderrPolicy,
}

impl Executor<ProcessRunner> {
    /// Executor that spawns real client processes.
    pub fn new(config: ClientConfig) -> Self {
        let stderr_policy = config.stderr_policy;
        Self::with_runner(ProcessRunner::new(config), stderr_policy)
    }
}

impl<R: ClientRunner> Executor<R> {
    pub const fn with_runner(runner: R, stderr_policy: StderrPolicy) -> Self {
        Self {
            runner,
            stderr_policy,
        }
    }

    /// Whether the client can reach a running Emacs server right now.
    ///
    /// Runs [`PROBE_SCRIPT`] and requires a zero exit with some output.
    /// Every failure, including spawn errors and timeouts, yields `false`.
    pub async fn probe_liveness(&self) -> bool {
        match self.runner.run(PROBE_SCRIPT).await {
            Ok(out) if out.success && !out.stdout.trim().is_empty() => {
                debug!(result = out.stdout.trim(), "Emacs server check succeeded");
                true
            }
            Ok(out) => {
                debug!(code = ?out.code, stderr = out.stderr.trim(), "Emacs server check failed");
                false
            }
            Err(e) => {
                debug!(error = %e, "Emacs server check failed");
                false
            }
        }
    }

    /// Liveness check; re-probes on every call.
    pub async fn check(&self) -> bool {
        self.probe_liveness().await
    }

    /// Run `script` and return its trimmed stdout.
    pub async fn execute(&self, script: &str) -> BridgeResult<String> {
        if !self.probe_liveness().await {
            warn!("Emacs server is not running");
            return Err(BridgeError::ServerUnavailable);
        }

        debug!(script, "executing Emacs command");
        let out = self.runner.run(script).await.map_err(|e| {
            error!(error = %e, "failed to run Emacs command");
            BridgeError::execution(e.to_string(), None)
        })?;

        if !out.success {
            let message = out.code.map_or_else(
                || "Command terminated by signal".to_owned(),
                |code| format!("Command failed with exit code {code}"),
            );
            error!(code = ?out.code, stderr = out.stderr.trim(), "Emacs command failed");
            return Err(BridgeError::execution(message, Some(out.stderr)));
        }

        if !out.stderr.is_empty() {
            match self.stderr_policy {
                StderrPolicy::Fail => {
                    error!(stderr = out.stderr.trim(), "Emacs command wrote to stderr");
                    return Err(BridgeError::execution(
                        "Command execution failed",
                        Some(out.stderr),
                    ));
                }
                StderrPolicy::Warn => {
                    warn!(stderr = out.stderr.trim(), "Emacs command warning");
                }
            }
        }

        let result = out.stdout.trim();
        info!(result, "Emacs command succeeded");
        Ok(result.to_owned())
    }
}
