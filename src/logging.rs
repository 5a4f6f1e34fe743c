//! Tracing setup.
//!
//! Logs go to stderr by default so stdout stays reserved for MCP stdio
//! traffic. With a log file configured, the file is truncated once here and
//! receives all output for the life of the process.

use std::fs::File;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

const DEFAULT_FILTER: &str = "warn,emacs_mcp=info";

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(config: &LogConfig) -> Result<()> {
    let default = config.default_filter.as_deref().unwrap_or(DEFAULT_FILTER);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(filter);
    match &config.file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
        None => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr).compact())
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
    }
    Ok(())
}
