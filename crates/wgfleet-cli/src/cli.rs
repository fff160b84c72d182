//! Command-line argument parsing with clap.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Administers a fleet of WireGuard servers and their peers.
#[derive(Parser, Debug)]
#[command(name = "wgfleet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Bucket the canonical database is synced against.
    #[arg(long, env = "GCS_BUCKET_NAME")]
    pub bucket: Option<String>,

    /// Base64 AES key protecting server private keys at rest. If unset, a
    /// random key is generated and printed once on first use.
    #[arg(long, env = "CIPHER_KEY")]
    pub cipher_key: Option<String>,

    /// Disable remote sync entirely; operate on a purely local database.
    #[arg(long)]
    pub local_only: bool,

    /// Scratch directory the local copy of the database lives in.
    #[arg(long, default_value = "./wgfleet-data")]
    pub workdir: PathBuf,

    /// Output format for list/get commands.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
    /// YAML output for scripting.
    Yaml,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Server lifecycle management.
    Server {
        /// Server subcommand to execute.
        #[command(subcommand)]
        command: ServerCommands,
    },
    /// Peer lifecycle management.
    Peer {
        /// Peer subcommand to execute.
        #[command(subcommand)]
        command: PeerCommands,
    },
    /// Run a reconciliation agent.
    Agent {
        /// Agent subcommand to execute.
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Run the client config delivery server.
    Web(WebArgs),
}

/// Server subcommands.
#[derive(Subcommand, Debug)]
pub enum ServerCommands {
    /// Create or overwrite a server.
    Add {
        /// Server name.
        name: String,
        /// Subnet in CIDR form, e.g. `10.8.0.0/24`.
        #[arg(long)]
        address: String,
        /// Public `host:port` clients dial.
        #[arg(long)]
        endpoint: String,
        /// UDP listen port.
        #[arg(long, default_value_t = 51820)]
        listen_port: u16,
        /// Allow overwriting an existing server of the same name.
        #[arg(long)]
        r#override: bool,
    },
    /// List all servers.
    List,
    /// Remove a server.
    Remove {
        /// Server name.
        name: String,
    },
}

/// Peer subcommands.
#[derive(Subcommand, Debug)]
pub enum PeerCommands {
    /// Create a new peer.
    Add {
        /// The server this peer is attached to.
        server: String,
        /// The peer's name; together with `server` this forms its UID.
        name: String,
        /// A specific address to reserve instead of auto-allocating one.
        #[arg(long)]
        address: Option<String>,
        /// A public key that never rotates on download.
        #[arg(long)]
        public_key: Option<String>,
        /// What happens once the peer's lease expires.
        #[arg(long, value_enum, default_value_t = ExpireActionArg::Default)]
        expire_action: ExpireActionArg,
        /// Lease duration, e.g. `24h`.
        #[arg(long, default_value = "24h")]
        expire_duration: String,
    },
    /// List peers, optionally filtered to one server.
    List {
        /// Restrict the listing to this server.
        #[arg(long)]
        server: Option<String>,
    },
    /// Remove a peer.
    Remove {
        /// The peer's UID, `<server>/<name>`.
        uid: String,
    },
}

/// Mirrors [`wgfleet_store::ExpireAction`] for clap's `ValueEnum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExpireActionArg {
    /// No expiry is enforced.
    Default,
    /// The peer's clock resets and it is treated as freshly created.
    Reset,
    /// The peer is locked out of the live interface once expired.
    Block,
}

impl From<ExpireActionArg> for wgfleet_store::ExpireAction {
    fn from(value: ExpireActionArg) -> Self {
        match value {
            ExpireActionArg::Default => Self::Default,
            ExpireActionArg::Reset => Self::Reset,
            ExpireActionArg::Block => Self::Block,
        }
    }
}

/// Agent subcommands.
#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// Reconcile the on-disk interface file to the server record.
    Server {
        /// Server name in the store.
        server: String,
        /// Path to the on-disk WireGuard interface config.
        #[arg(long)]
        config: PathBuf,
        /// If set, loop forever, sleeping this many seconds between passes.
        #[arg(long)]
        sync: Option<u64>,
    },
    /// Reconcile a live interface's peers to the desired roster.
    Peer {
        /// Server name in the store.
        server: String,
        /// The live interface name, e.g. `wg0`.
        #[arg(long)]
        iface: String,
        /// If set, loop forever, sleeping this many seconds between passes.
        #[arg(long)]
        sync: Option<u64>,
    },
}

/// Arguments for the `web` subcommand.
#[derive(clap::Args, Debug)]
pub struct WebArgs {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,
    /// Header carrying the caller's session email, for the default
    /// header-based session source.
    #[arg(long, default_value = "x-session-email")]
    pub session_header: String,
}
