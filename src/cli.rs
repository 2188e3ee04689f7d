//! Command-line interface definition and parsing.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{
    NodeConfig, DEFAULT_CLIENT_BIN, DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_HTTP_PORT,
    DEFAULT_LOG_TAIL_LINES, DEFAULT_NETWORK_ID, DEFAULT_P2P_PORT, DEFAULT_WS_PORT,
};

/// nodectl - supervise and administer an external blockchain client node
#[derive(Parser, Debug, Clone)]
#[command(
    name = "nodectl",
    about = "Supervise and administer an external blockchain client node",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(flatten)]
    pub node: NodeOpts,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand; they assemble into a [`NodeConfig`].
#[derive(Args, Debug, Clone)]
pub struct NodeOpts {
    /// Name or path of the client binary
    #[arg(long, global = true, default_value = DEFAULT_CLIENT_BIN)]
    pub client_bin: String,

    /// Working directory for chain data, the PID record, and the log
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Network identifier passed to the client
    #[arg(long, global = true, default_value_t = DEFAULT_NETWORK_ID)]
    pub network_id: u64,

    /// P2P listening port
    #[arg(long, global = true, default_value_t = DEFAULT_P2P_PORT)]
    pub p2p_port: u16,

    /// HTTP JSON-RPC port
    #[arg(long, global = true, default_value_t = DEFAULT_HTTP_PORT)]
    pub http_port: u16,

    /// WebSocket JSON-RPC port
    #[arg(long, global = true, default_value_t = DEFAULT_WS_PORT)]
    pub ws_port: u16,

    /// Password/key-material file handed to the client at start
    #[arg(long, global = true)]
    pub key_file: Option<PathBuf>,

    /// Host the client binds its RPC servers to (also used for probes)
    #[arg(long, global = true, default_value = DEFAULT_HOST)]
    pub host: String,
}

impl NodeOpts {
    pub fn into_config(self) -> NodeConfig {
        NodeConfig {
            client_bin: self.client_bin,
            data_dir: self.data_dir,
            network_id: self.network_id,
            p2p_port: self.p2p_port,
            http_port: self.http_port,
            ws_port: self.ws_port,
            key_file: self.key_file,
            host: self.host,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Verify the client binary is installed and prepare the data directory
    Install,

    /// Launch the node in the background and wait for its RPC to come up
    Start,

    /// Stop the running node and remove its record
    Stop,

    /// Report whether a supervised node is running
    Status,

    /// Show the tail of the node log
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_TAIL_LINES)]
        lines: usize,
    },

    /// Print this node's enode URL
    Enode,

    /// Connect to a peer
    #[command(name = "add-peer")]
    AddPeer {
        /// Peer enode URL
        url: String,
    },

    /// Disconnect from a peer
    #[command(name = "remove-peer")]
    RemovePeer {
        /// Peer enode URL
        url: String,
    },

    /// List connected peers
    Peers,

    /// Show sync status
    Sync,

    /// Probe the HTTP and WebSocket RPC endpoints
    Check,
}

impl Cli {
    /// Parse argv; on failure clap prints usage and exits non-zero.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse from an explicit argv (used by tests).
    pub fn try_parse_args_from<I, T>(iter: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(iter)
    }
}
