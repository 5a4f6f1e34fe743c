//! emacs-mcp -- MCP / HTTP bridge to a running Emacs server.
//!
//! Usage: emacs-mcp [--http] [--port <port>] [--client <emacsclient>]

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use emacs_mcp::config::{
    ClientConfig, DEFAULT_CLIENT, DEFAULT_PORT, InvocationMode, LogConfig, StderrPolicy, Transport,
};
use emacs_mcp::tools::ToolRouter;
use emacs_mcp::{Executor, http, logging, server};

#[derive(Debug, Parser)]
#[command(name = "emacs-mcp", version)]
#[command(about = "Expose Emacs actions to MCP clients through emacsclient")]
struct Args {
    /// Serve HTTP (REST + POST /mcp) instead of stdio
    #[arg(long, env = "HTTP_TRANSPORT")]
    http: bool,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address for the HTTP transport
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// emacsclient binary name or path
    #[arg(long, env = "EMACSCLIENT", default_value = DEFAULT_CLIENT)]
    client: String,

    /// How emacsclient is launched
    #[arg(long, env = "EMACS_MCP_INVOCATION", value_enum, default_value_t = InvocationMode::Argv)]
    invocation: InvocationMode,

    /// Kill emacsclient after this many seconds (default: wait forever)
    #[arg(long, env = "EMACS_MCP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Treatment of stderr output from a successful emacsclient run
    #[arg(long, env = "EMACS_MCP_STDERR_POLICY", value_enum, default_value_t = StderrPolicy::Fail)]
    stderr_policy: StderrPolicy,

    /// Write logs to this file (truncated at startup) instead of stderr
    #[arg(long, env = "EMACS_MCP_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            client: self.client.clone(),
            invocation: self.invocation,
            timeout: self.timeout_secs.map(Duration::from_secs),
            stderr_policy: self.stderr_policy,
        }
    }

    fn transport(&self) -> Transport {
        if self.http {
            Transport::Http(SocketAddr::new(self.bind, self.port))
        } else {
            Transport::Stdio
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    logging::init(&LogConfig {
        file: args.log_file.clone(),
        default_filter: None,
    })?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting emacs-mcp");

    match which::which(&args.client) {
        Ok(path) => info!(path = %path.display(), "found emacsclient"),
        Err(e) => warn!(client = args.client, error = %e, "could not locate emacsclient"),
    }

    let router = ToolRouter::new(Executor::new(args.client_config()));

    // Informational only; commands fail individually until Emacs is up.
    if router.executor().probe_liveness().await {
        info!("Emacs server is running");
    } else {
        warn!("Emacs server is not running. Please start it with M-x server-start");
    }

    let outcome = match args.transport() {
        Transport::Stdio => {
            tokio::select! {
                res = server::run_mcp_server(&router) => res,
                () = shutdown_signal() => Ok(()),
            }
        }
        Transport::Http(addr) => http::serve_http(addr, router, shutdown_signal()).await,
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = format!("{e:#}"), "emacs-mcp failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down emacs-mcp"),
        Err(e) => {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
