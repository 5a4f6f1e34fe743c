//! Error types for the emacs-mcp crate.

use serde::Serialize;

/// Message returned whenever the liveness probe fails.
pub const SERVER_NOT_RUNNING: &str =
    "Emacs server is not running. Please start it with M-x server-start";

/// Bridge error types.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The liveness probe failed; no command was attempted.
    #[error("{}", SERVER_NOT_RUNNING)]
    ServerUnavailable,

    /// emacsclient exited non-zero, failed to spawn, timed out, or wrote to
    /// stderr under the strict stderr policy.
    #[error("{message}")]
    ExecutionFailed {
        message: String,
        stderr: Option<String>,
    },

    /// A supplied file or repository path could not be made absolute.
    #[error("Failed to resolve path: {0}")]
    PathResolutionFailed(String),

    /// Tool or request arguments did not match the declared schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// An action-level failure wrapping the underlying cause.
    #[error("{context}: {source}")]
    Action {
        context: &'static str,
        #[source]
        source: Box<BridgeError>,
    },
}

/// Flat error classification exposed to transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ServerUnavailable,
    ExecutionFailed,
    PathResolutionFailed,
    InvalidArguments,
}

impl BridgeError {
    pub(crate) fn execution(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ExecutionFailed {
            message: message.into(),
            stderr: stderr.filter(|s| !s.is_empty()),
        }
    }

    /// Wrap this error with an action-specific prefix.
    #[must_use]
    pub fn context(self, context: &'static str) -> Self {
        Self::Action {
            context,
            source: Box::new(self),
        }
    }

    /// Kind of the innermost error; action wrappers are transparent.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ServerUnavailable => ErrorKind::ServerUnavailable,
            Self::ExecutionFailed { .. } => ErrorKind::ExecutionFailed,
            Self::PathResolutionFailed(_) => ErrorKind::PathResolutionFailed,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
            Self::Action { source, .. } => source.kind(),
        }
    }

    /// Captured stderr of the failed emacsclient run, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ExecutionFailed { stderr, .. } => stderr.as_deref(),
            Self::Action { source, .. } => source.stderr(),
            _ => None,
        }
    }

    /// The message without any action prefix.
    pub fn root_message(&self) -> String {
        match self {
            Self::Action { source, .. } => source.root_message(),
            other => other.to_string(),
        }
    }
}

/// Convenience result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
