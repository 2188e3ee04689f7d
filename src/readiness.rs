//! Bounded readiness polling.
//!
//! After `start`, the client needs a moment before its RPC server answers.
//! The poll is fixed-interval with a capped attempt count and reports its
//! outcome explicitly; the caller decides what a timeout means (for `start`
//! it is a warning, not a failure).

use std::time::Duration;

use tracing::debug;

use crate::config::NodeConfig;
use crate::relay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The RPC endpoint answered within the attempt budget.
    Ready,
    /// Every attempt failed; the node may still come up later.
    TimedOut,
}

/// Poll the HTTP JSON-RPC endpoint until it answers or `attempts` runs out.
pub async fn wait_for_rpc(config: &NodeConfig, attempts: u32, interval: Duration) -> Readiness {
    for attempt in 1..=attempts {
        if relay::probe_http(config).await.is_ok() {
            debug!(attempt, "RPC endpoint is up");
            return Readiness::Ready;
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Readiness::TimedOut
}
