//! Runtime configuration shared by the executor and the transports.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default remote-control client binary.
pub const DEFAULT_CLIENT: &str = "emacsclient";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// How the client process is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum InvocationMode {
    /// `<client> -e <script>` with the script as its own argv entry.
    #[default]
    Argv,
    /// `sh -c "<client> -e '<escaped-script>'"`.
    ///
    /// The escape only prefixes `'` with a backslash, and inside POSIX
    /// single quotes `\'` closes the quoted word. Any script containing `'`
    /// therefore fails to parse in the shell. Use [`InvocationMode::Argv`]
    /// for such scripts.
    Shell,
}

/// What to do when the client exits zero but writes to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StderrPolicy {
    /// Treat any stderr output as a failed command.
    #[default]
    Fail,
    /// Log stderr as a warning and return stdout.
    Warn,
}

/// Configuration for the emacsclient executor.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Client binary name or path.
    pub client: String,
    pub invocation: InvocationMode,
    /// Upper bound for a single client run. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub stderr_policy: StderrPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client: DEFAULT_CLIENT.to_owned(),
            invocation: InvocationMode::default(),
            timeout: None,
            stderr_policy: StderrPolicy::default(),
        }
    }
}

/// Which transport the process serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// JSON-RPC over stdin/stdout.
    Stdio,
    /// REST API plus `POST /mcp` on a TCP listener.
    Http(SocketAddr),
}

/// Logging destination.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Truncated on init and written instead of stderr when set.
    pub file: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset.
    pub default_filter: Option<String>,
}
