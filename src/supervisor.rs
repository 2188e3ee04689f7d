//! Process supervisor.
//!
//! Owns the start/observe/stop lifecycle of exactly one background process per
//! working directory. The persisted PID record (`node.pid`) is the sole source
//! of truth across invocations: every controlling run is a fresh process with
//! no in-memory state, so the record plus an OS liveness check decide what is
//! actually running.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PID_FILE_NAME;
use crate::platform;

// Bounded wait between SIGTERM and SIGKILL when stopping a node.
const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("client binary not found: '{0}' is not in PATH")]
    ClientNotFound(String),
    #[error("a node is already running in {} (pid {pid}); stop it first", .dir.display())]
    AlreadyRunning { dir: PathBuf, pid: u32 },
    #[error("no running node in {}", .0.display())]
    NotRunning(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Handle to a freshly launched process.
#[derive(Debug)]
pub struct ProcessHandle {
    pub pid: u32,
    pub pid_path: PathBuf,
    pub log_path: PathBuf,
}

/// Outcome of reconciling the persisted record with the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// A record exists and the OS confirms the process is alive.
    Running(u32),
    /// No record exists (the normal "stopped" state, not an error).
    NotRunning,
    /// A record existed but the process is dead; the record has been deleted.
    Stale(u32),
}

/// Launch `program` with `args` as a detached background process.
///
/// Standard output and error are appended to `log_path`, and the child's PID
/// is persisted to `<data_dir>/node.pid`. Fails fast when a live record
/// already exists for the directory: the client would reject the duplicate via
/// its own lock file anyway, but a clear message beats letting the child
/// crash.
pub fn launch(
    program: &str,
    args: &[String],
    data_dir: &Path,
    log_path: &Path,
) -> Result<ProcessHandle, SupervisorError> {
    if let ProcessStatus::Running(pid) = status(data_dir)? {
        return Err(SupervisorError::AlreadyRunning {
            dir: data_dir.to_path_buf(),
            pid,
        });
    }

    let program = which::which(program)
        .map_err(|_| SupervisorError::ClientNotFound(program.to_string()))?;

    fs::create_dir_all(data_dir)?;

    let log_file = OpenOptions::new().create(true).append(true).open(log_path)?;
    let log_for_stderr = log_file.try_clone()?;

    let mut command = Command::new(&program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_for_stderr));

    platform::detach(&mut command);

    let child = command.spawn()?;
    let pid = child.id();

    // Reap the child if it exits while this invocation is still alive; once
    // the invocation exits, the detached child reparents to init.
    std::thread::spawn(move || {
        let mut child = child;
        let _ = child.wait();
    });

    if let Err(err) = write_record(data_dir, pid) {
        // Do not leak an untracked child when the record cannot be written.
        platform::terminate_process(pid, STOP_GRACE);
        return Err(err.into());
    }

    debug!(pid, data_dir = %data_dir.display(), log = %log_path.display(), "launched node process");

    Ok(ProcessHandle {
        pid,
        pid_path: data_dir.join(PID_FILE_NAME),
        log_path: log_path.to_path_buf(),
    })
}

/// Reconcile the persisted record with reality.
///
/// A record pointing at a dead PID is reported as [`ProcessStatus::Stale`] and
/// deleted as a side effect, so the next call returns `NotRunning`. This is
/// what recovers supervisor state after crashes or external kills.
pub fn status(data_dir: &Path) -> Result<ProcessStatus, SupervisorError> {
    let pid_path = data_dir.join(PID_FILE_NAME);

    let Some(pid) = read_record(&pid_path)? else {
        return Ok(ProcessStatus::NotRunning);
    };

    if platform::process_alive(pid) {
        Ok(ProcessStatus::Running(pid))
    } else {
        fs::remove_file(&pid_path)?;
        debug!(pid, "removed stale record");
        Ok(ProcessStatus::Stale(pid))
    }
}

/// Stop the supervised process and remove its record.
///
/// Termination escalates: SIGTERM, a bounded wait, then SIGKILL. Fails with
/// [`SupervisorError::NotRunning`] when no valid record exists; in that case
/// nothing is written or removed beyond the stale-record cleanup `status`
/// already performs.
pub fn stop(data_dir: &Path) -> Result<u32, SupervisorError> {
    let pid = match status(data_dir)? {
        ProcessStatus::Running(pid) => pid,
        ProcessStatus::NotRunning | ProcessStatus::Stale(_) => {
            return Err(SupervisorError::NotRunning(data_dir.to_path_buf()));
        }
    };

    if !platform::terminate_process(pid, STOP_GRACE) {
        warn!(pid, "process survived SIGKILL; leaving record in place");
        return Err(SupervisorError::Io(io::Error::other(format!(
            "failed to terminate pid {pid}"
        ))));
    }

    fs::remove_file(data_dir.join(PID_FILE_NAME))?;
    debug!(pid, data_dir = %data_dir.display(), "stopped node process");
    Ok(pid)
}

/// Return the last `count` lines of the log. Purely observational; a missing
/// log file reads as empty.
pub fn tail_log(log_path: &Path, count: usize) -> io::Result<Vec<String>> {
    let contents = match fs::read_to_string(log_path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(count);
    Ok(lines[start..].iter().map(|s| s.to_string()).collect())
}

fn write_record(data_dir: &Path, pid: u32) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(data_dir.join(PID_FILE_NAME))?;
    writeln!(file, "{pid}")?;
    file.sync_all()
}

fn read_record(pid_path: &Path) -> io::Result<Option<u32>> {
    let contents = match fs::read_to_string(pid_path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };

    match contents.trim().parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(Some(pid)),
        _ => {
            // An unreadable record cannot name a live process; discard it.
            warn!(path = %pid_path.display(), "discarding corrupt PID record");
            fs::remove_file(pid_path)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn tail_log_returns_last_lines() {
        let dir = tempdir().expect("temp dir");
        let log = dir.path().join("node.log");
        fs::write(&log, "one\ntwo\nthree\nfour\n").expect("write log");

        assert_eq!(tail_log(&log, 2).unwrap(), vec!["three", "four"]);
        assert_eq!(tail_log(&log, 10).unwrap().len(), 4);
    }

    #[test]
    fn tail_log_on_missing_file_is_empty() {
        let dir = tempdir().expect("temp dir");
        assert!(tail_log(&dir.path().join("node.log"), 5).unwrap().is_empty());
    }

    #[test]
    fn status_without_record_is_not_running() {
        let dir = tempdir().expect("temp dir");
        assert_eq!(status(dir.path()).unwrap(), ProcessStatus::NotRunning);
    }

    #[test]
    fn corrupt_record_is_discarded() {
        let dir = tempdir().expect("temp dir");
        let pid_path = dir.path().join(PID_FILE_NAME);
        fs::write(&pid_path, "not-a-pid\n").expect("write record");

        assert_eq!(status(dir.path()).unwrap(), ProcessStatus::NotRunning);
        assert!(!pid_path.exists());
    }
}
