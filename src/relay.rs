//! External command relay.
//!
//! Stateless pass-throughs against the running client: each helper formats a
//! fixed console expression, shells into the client's `attach` console, and
//! returns the raw response. Failures are propagated verbatim; nothing here
//! interprets the client's output.

use std::process::Command;

use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::{NodeConfig, PROBE_TIMEOUT};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("client binary not found: '{0}' is not in PATH")]
    ClientNotFound(String),
    #[error("peer URL must not be empty")]
    EmptyPeerUrl,
    #[error("peer URL must not contain quotes: {0}")]
    InvalidPeerUrl(String),
    #[error("console command failed ({expr}): {message}")]
    ExternalCall { expr: String, message: String },
    #[error("RPC probe failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reachability of the client's RPC endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub http_ok: bool,
    pub ws_ok: bool,
}

/// Attach to the running client's console and evaluate one expression,
/// returning its raw stdout.
pub fn console_exec(config: &NodeConfig, expr: &str) -> Result<String, RelayError> {
    let program = which::which(&config.client_bin)
        .map_err(|_| RelayError::ClientNotFound(config.client_bin.clone()))?;

    debug!(expr, "attaching to client console");

    let output = Command::new(program)
        .args(config.attach_args(expr))
        .output()?;

    if !output.status.success() {
        return Err(RelayError::ExternalCall {
            expr: expr.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn enode(config: &NodeConfig) -> Result<String, RelayError> {
    console_exec(config, "admin.nodeInfo.enode")
}

pub fn peers(config: &NodeConfig) -> Result<String, RelayError> {
    console_exec(config, "admin.peers")
}

pub fn sync_status(config: &NodeConfig) -> Result<String, RelayError> {
    console_exec(config, "eth.syncing")
}

pub fn add_peer(config: &NodeConfig, url: &str) -> Result<String, RelayError> {
    let url = validated_peer_url(url)?;
    console_exec(config, &format!("admin.addPeer(\"{url}\")"))
}

pub fn remove_peer(config: &NodeConfig, url: &str) -> Result<String, RelayError> {
    let url = validated_peer_url(url)?;
    console_exec(config, &format!("admin.removePeer(\"{url}\")"))
}

// Rejects arguments that would make no sense (or would escape the console
// expression) before any external call is made.
fn validated_peer_url(url: &str) -> Result<&str, RelayError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(RelayError::EmptyPeerUrl);
    }
    if url.contains('"') || url.contains('\\') {
        return Err(RelayError::InvalidPeerUrl(url.to_string()));
    }
    Ok(url)
}

/// Minimal JSON-RPC request envelope; the response schema belongs to the
/// client and is only logged, never interpreted.
#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    method: &'a str,
    params: [&'a str; 0],
    id: u32,
}

/// POST a minimal JSON-RPC envelope to the HTTP endpoint.
///
/// Any well-formed HTTP response counts as reachable; the method result is the
/// client's business.
pub async fn probe_http(config: &NodeConfig) -> Result<(), RelayError> {
    let client = reqwest::Client::builder().timeout(PROBE_TIMEOUT).build()?;
    let envelope = RpcRequest {
        jsonrpc: "2.0",
        method: "net_version",
        params: [],
        id: 1,
    };

    let response = client
        .post(config.http_endpoint())
        .json(&envelope)
        .send()
        .await?;

    let body = response.bytes().await?;
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&body) {
        debug!(%value, "RPC probe response");
    }
    Ok(())
}

/// Raw TCP connect-and-close against the WebSocket port.
pub async fn probe_ws(config: &NodeConfig) -> bool {
    tokio::time::timeout(PROBE_TIMEOUT, TcpStream::connect(config.ws_addr()))
        .await
        .map(|result| result.is_ok())
        .unwrap_or(false)
}

/// Probe both RPC endpoints and report which answered.
pub async fn check(config: &NodeConfig) -> CheckReport {
    let http_ok = probe_http(config).await.is_ok();
    let ws_ok = probe_ws(config).await;
    CheckReport { http_ok, ws_ok }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_peer_url_is_rejected_before_any_external_call() {
        let config = NodeConfig {
            // A binary that cannot exist: proves validation runs first.
            client_bin: "definitely-not-a-real-client".into(),
            ..NodeConfig::default()
        };
        assert!(matches!(
            add_peer(&config, ""),
            Err(RelayError::EmptyPeerUrl)
        ));
        assert!(matches!(
            remove_peer(&config, "   "),
            Err(RelayError::EmptyPeerUrl)
        ));
    }

    #[test]
    fn quoted_peer_url_is_rejected() {
        let config = NodeConfig {
            client_bin: "definitely-not-a-real-client".into(),
            ..NodeConfig::default()
        };
        assert!(matches!(
            add_peer(&config, "enode://\"x"),
            Err(RelayError::InvalidPeerUrl(_))
        ));
    }

    #[test]
    fn missing_client_surfaces_as_client_not_found() {
        let config = NodeConfig {
            client_bin: "definitely-not-a-real-client".into(),
            ..NodeConfig::default()
        };
        assert!(matches!(
            peers(&config),
            Err(RelayError::ClientNotFound(_))
        ));
    }

    #[tokio::test]
    async fn ws_probe_succeeds_against_a_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let config = NodeConfig {
            ws_port: port,
            ..NodeConfig::default()
        };
        assert!(probe_ws(&config).await);
    }

    #[tokio::test]
    async fn ws_probe_fails_with_no_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let config = NodeConfig {
            ws_port: port,
            ..NodeConfig::default()
        };
        assert!(!probe_ws(&config).await);
    }
}
