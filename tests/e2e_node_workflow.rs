#![cfg(unix)]

//! End-to-end workflow through the binary: start a stub client, observe it,
//! and stop it, exactly as an operator would.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::TempDir;

fn nodectl() -> Command {
    Command::cargo_bin("nodectl").expect("binary builds")
}

/// A port nothing listens on: bind an ephemeral listener and drop it.
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    port
}

fn make_stub_client(root: &TempDir) -> PathBuf {
    let path = root.path().join("client");
    let script = "#!/bin/sh\necho \"stub client: $@\"\nsleep 60\n";
    fs::write(&path, script).expect("write client stub");
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set permissions");
    }
    path
}

#[test]
#[serial]
fn start_status_logs_stop_roundtrip() {
    let root = TempDir::new().expect("temp dir");
    let stub = make_stub_client(&root);
    let data_dir = root.path().join("node1");

    // The stub never serves RPC, so start reports a readiness timeout but
    // still succeeds: launching is best-effort with respect to readiness.
    nodectl()
        .args(["start", "--client-bin"])
        .arg(&stub)
        .arg("--data-dir")
        .arg(&data_dir)
        .args([
            "--http-port",
            &free_port().to_string(),
            "--ws-port",
            &free_port().to_string(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("started node (pid "));

    let pid: u32 = fs::read_to_string(data_dir.join("node.pid"))
        .expect("pid file exists")
        .trim()
        .parse()
        .expect("pid file holds a positive integer");
    assert!(pid > 0);

    nodectl()
        .args(["status", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("running (pid {pid})")));

    nodectl()
        .args(["logs", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("stub client:"));

    nodectl()
        .args(["stop", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("stopped node (pid {pid})")));

    assert!(!data_dir.join("node.pid").exists());

    nodectl()
        .args(["status", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}

#[test]
#[serial]
fn status_clears_a_stale_record_left_by_a_crash() {
    let root = TempDir::new().expect("temp dir");
    let data_dir = root.path().join("node1");
    fs::create_dir_all(&data_dir).expect("create data dir");

    // A PID that is certainly dead.
    let mut child = std::process::Command::new("true").spawn().expect("spawn");
    child.wait().expect("wait");
    fs::write(data_dir.join("node.pid"), format!("{}\n", child.id())).expect("write record");

    nodectl()
        .args(["status", "--data-dir"])
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("stale record"));

    assert!(!data_dir.join("node.pid").exists());
}
