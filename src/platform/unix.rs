use std::io;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

// How often liveness is re-checked while waiting for SIGTERM to take effect.
const TERMINATION_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Detach a child from the supervising invocation.
///
/// The child gets its own session (and process group), so it survives the
/// supervisor exiting and never receives the terminal's signals.
pub fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;

    unsafe {
        cmd.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

/// Check if a process is alive.
///
/// Signal 0 probes existence without delivering anything; EPERM means the
/// process exists but belongs to another user, which still counts as alive.
pub fn process_alive(pid: u32) -> bool {
    let c_pid = pid as libc::pid_t;
    match send_signal(c_pid, 0) {
        Ok(()) => true,
        Err(errno) => errno == libc::EPERM,
    }
}

/// Terminate a process: SIGTERM first, then SIGKILL if it is still alive
/// after the grace period.
///
/// Returns `true` once the process is gone (or was already gone).
pub fn terminate_process(pid: u32, grace: Duration) -> bool {
    let c_pid = pid as libc::pid_t;

    if !process_alive(pid) {
        return true;
    }

    if send_signal(c_pid, libc::SIGTERM).is_ok() {
        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if !process_alive(pid) {
                return true;
            }
            thread::sleep(TERMINATION_CHECK_INTERVAL);
        }
    }

    if send_signal(c_pid, libc::SIGKILL).is_ok() {
        debug!(pid, "sent SIGKILL after grace period");
    }
    thread::sleep(TERMINATION_CHECK_INTERVAL);
    !process_alive(pid)
}

/// Encapsulates the unsafe kill call and returns the errno on failure.
fn send_signal(pid: libc::pid_t, signal: libc::c_int) -> Result<(), libc::c_int> {
    let result = unsafe { libc::kill(pid, signal) };
    if result == 0 {
        Ok(())
    } else {
        Err(last_errno())
    }
}

fn last_errno() -> libc::c_int {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        unsafe { *libc::__errno_location() }
    }

    #[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
    {
        unsafe { *libc::__error() }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "macos",
        target_os = "ios",
        target_os = "freebsd"
    )))]
    {
        0
    }
}
