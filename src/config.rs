//! Node configuration.
//!
//! Everything the original deployment hard-coded (data directory, network id,
//! ports, key file, reachable host) lives in an explicit [`NodeConfig`] that is
//! built once from the command line and passed down; nothing reads ambient
//! globals.

use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PID_FILE_NAME: &str = "node.pid";
pub const LOG_FILE_NAME: &str = "node.log";

pub const DEFAULT_CLIENT_BIN: &str = "geth";
pub const DEFAULT_DATA_DIR: &str = "node";
pub const DEFAULT_NETWORK_ID: u64 = 1337;
pub const DEFAULT_P2P_PORT: u16 = 30303;
pub const DEFAULT_HTTP_PORT: u16 = 8545;
pub const DEFAULT_WS_PORT: u16 = 8546;
pub const DEFAULT_HOST: &str = "127.0.0.1";

pub const DEFAULT_LOG_TAIL_LINES: usize = 40;

// Readiness polling after launch: fixed interval, capped attempts.
pub const READY_POLL_ATTEMPTS: u32 = 10;
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

// Per-request timeout for the JSON-RPC reachability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration for one supervised node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Name or path of the external client binary.
    pub client_bin: String,
    /// Working directory holding the client's chain data, the PID record, and the log.
    pub data_dir: PathBuf,
    pub network_id: u64,
    pub p2p_port: u16,
    pub http_port: u16,
    pub ws_port: u16,
    /// Password/key-material file handed to the client at start, if any.
    pub key_file: Option<PathBuf>,
    /// Host used for connectivity probes and RPC readiness checks.
    pub host: String,
}

impl NodeConfig {
    pub fn pid_path(&self) -> PathBuf {
        self.data_dir.join(PID_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    pub fn http_endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.http_port)
    }

    pub fn ws_addr(&self) -> String {
        format!("{}:{}", self.host, self.ws_port)
    }

    /// The fixed flag set the client is launched with.
    ///
    /// The HTTP/WS servers are bound to the configured host and expose the
    /// admin namespace so the command relay can reach `admin.*` through the
    /// console as well as over RPC.
    pub fn client_args(&self) -> Vec<String> {
        let mut args = vec![
            "--datadir".into(),
            self.data_dir.display().to_string(),
            "--networkid".into(),
            self.network_id.to_string(),
            "--port".into(),
            self.p2p_port.to_string(),
            "--http".into(),
            "--http.addr".into(),
            self.host.clone(),
            "--http.port".into(),
            self.http_port.to_string(),
            "--http.api".into(),
            "eth,net,web3,admin".into(),
            "--ws".into(),
            "--ws.addr".into(),
            self.host.clone(),
            "--ws.port".into(),
            self.ws_port.to_string(),
            "--ws.api".into(),
            "eth,net,web3,admin".into(),
        ];
        if let Some(key_file) = &self.key_file {
            args.push("--password".into());
            args.push(key_file.display().to_string());
        }
        args
    }

    /// Arguments for attaching to the running client's console and evaluating
    /// a single expression.
    pub fn attach_args(&self, expr: &str) -> Vec<String> {
        vec![
            "attach".into(),
            "--datadir".into(),
            self.data_dir.display().to_string(),
            "--exec".into(),
            expr.to_string(),
        ]
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            client_bin: DEFAULT_CLIENT_BIN.to_string(),
            data_dir: Path::new(DEFAULT_DATA_DIR).to_path_buf(),
            network_id: DEFAULT_NETWORK_ID,
            p2p_port: DEFAULT_P2P_PORT,
            http_port: DEFAULT_HTTP_PORT,
            ws_port: DEFAULT_WS_PORT,
            key_file: None,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_the_data_dir() {
        let config = NodeConfig {
            data_dir: PathBuf::from("/tmp/node1"),
            ..NodeConfig::default()
        };
        assert_eq!(config.pid_path(), PathBuf::from("/tmp/node1/node.pid"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/node1/node.log"));
    }

    #[test]
    fn client_args_carry_the_configured_ports() {
        let config = NodeConfig {
            http_port: 9545,
            ws_port: 9546,
            ..NodeConfig::default()
        };
        let args = config.client_args();
        assert!(args.windows(2).any(|w| w == ["--http.port", "9545"]));
        assert!(args.windows(2).any(|w| w == ["--ws.port", "9546"]));
        // No key file configured, so no password flag.
        assert!(!args.iter().any(|a| a == "--password"));
    }

    #[test]
    fn key_file_adds_the_password_flag() {
        let config = NodeConfig {
            key_file: Some(PathBuf::from("keys/pass.txt")),
            ..NodeConfig::default()
        };
        let args = config.client_args();
        assert!(args.windows(2).any(|w| w == ["--password", "keys/pass.txt"]));
    }
}
