//! Platform-specific process primitives: liveness checks, detachment, and
//! graceful-then-forceful termination.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{detach, process_alive, terminate_process};

#[cfg(not(unix))]
mod fallback {
    use std::process::Command;
    use std::time::Duration;

    pub fn detach(_cmd: &mut Command) {}

    pub fn process_alive(_pid: u32) -> bool {
        false
    }

    pub fn terminate_process(_pid: u32, _grace: Duration) -> bool {
        false
    }
}

#[cfg(not(unix))]
pub use fallback::{detach, process_alive, terminate_process};
