//! nodectl library
//!
//! Operational supervisor for an external blockchain client: launches the
//! client detached, tracks it through a persisted PID record, and relays
//! administrative commands to its console and RPC endpoints.

pub mod cli;
pub mod config;
pub mod platform;
pub mod readiness;
pub mod relay;
pub mod supervisor;

// Re-export commonly used types for convenience
pub use config::NodeConfig;
pub use readiness::Readiness;
pub use relay::{CheckReport, RelayError};
pub use supervisor::{ProcessHandle, ProcessStatus, SupervisorError};
