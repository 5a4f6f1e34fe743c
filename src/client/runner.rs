//! Subprocess seam: one emacsclient run per call.

use std::future::Future;
use std::io;
use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::debug;

use super::escape;
use crate::config::{ClientConfig, InvocationMode};

/// Captured outcome of one client run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ClientOutput {
    fn from_output(output: &Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs a single script through the remote-control client.
///
/// `Err` covers spawn failures and timeouts; a process that ran to
/// completion always yields `Ok`, whatever its exit status.
pub trait ClientRunner: Send + Sync {
    fn run(&self, script: &str) -> impl Future<Output = io::Result<ClientOutput>> + Send;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    config: ClientConfig,
}

impl ProcessRunner {
    pub const fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    fn command(&self, script: &str) -> Command {
        match self.config.invocation {
            InvocationMode::Argv => {
                let mut cmd = Command::new(&self.config.client);
                cmd.arg("-e").arg(script);
                cmd
            }
            InvocationMode::Shell => {
                let mut cmd = Command::new("sh");
                cmd.arg("-c")
                    .arg(escape::shell_command(&self.config.client, script));
                cmd
            }
        }
    }
}

impl ClientRunner for ProcessRunner {
    async fn run(&self, script: &str) -> io::Result<ClientOutput> {
        let mut cmd = self.command(script);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            client = self.config.client,
            invocation = ?self.config.invocation,
            "spawning client"
        );
        let child = cmd.spawn().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to spawn {}: {e}", self.config.client),
            )
        })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("{} timed out after {limit:?}", self.config.client),
                    )
                })??,
            None => child.wait_with_output().await?,
        };

        let output = ClientOutput::from_output(&output);
        debug!(
            code = ?output.code,
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "client finished"
        );
        Ok(output)
    }
}
