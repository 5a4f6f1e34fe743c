//! `emacs-mcp` — drive a running Emacs from MCP clients and HTTP callers.
//!
//! Every request ends up as one `emacsclient -e <elisp>` run, preceded by a
//! liveness probe. All transports share one [`Executor`].
//!
//! # Tools
//!
//! - `open_in_buffer` — visit a file in a new buffer
//! - `open_magit` — `magit-status` for a repository
//! - `check_server` — is the Emacs server reachable
//! - `list_tools` — describe the tools above
//!
//! # Architecture
//!
//! ```text
//! stdin (JSON-RPC) ─┐
//! POST /mcp ────────┼→ McpServer → ToolRouter ─┐
//! REST /api/tools ──┴──────────────→ actions ──┴→ Executor → emacsclient
//! ```

pub mod actions;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod server;
pub mod tools;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::Executor;
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use server::run_mcp_server;
