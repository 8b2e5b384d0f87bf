//! End-to-end signal behaviour of the `frpc` launcher binary
#![cfg(unix)]

use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use frpc_cli::artifacts::make_executable;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

const WAIT_LIMIT: Duration = Duration::from_secs(10);

/// Install `body` as the linux-x64 artifact in `dir`
fn install_artifact(dir: &Path, body: &str) {
    let path = dir.join("frpc-linux-x64");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    make_executable(&path).unwrap();
}

fn launch(dir: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_frpc"))
        .env("FRPC_NATIVE_DIR", dir)
        .env("FRPC_FORCE_PLATFORM", "linux")
        .env("FRPC_FORCE_ARCH", "x64")
        .env_remove("FRP_SERVER")
        .env_remove("FRP_TOKEN")
        .stdin(Stdio::null())
        .spawn()
        .unwrap()
}

fn wait_for(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + WAIT_LIMIT;
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("launcher still running after {WAIT_LIMIT:?}");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

fn wait_for_file(path: &Path) {
    let deadline = Instant::now() + WAIT_LIMIT;
    while !path.exists() {
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn interrupt_is_relayed_and_reraised() {
    let tmp = tempfile::tempdir().unwrap();
    let ready = tmp.path().join("ready");
    install_artifact(
        tmp.path(),
        &format!("touch '{}'\nexec sleep 30", ready.display()),
    );

    let mut launcher = launch(tmp.path());
    // The artifact only runs once the launcher's handlers are installed
    wait_for_file(&ready);
    kill(Pid::from_raw(launcher.id() as i32), Signal::SIGINT).unwrap();

    let status = wait_for(&mut launcher);
    assert_eq!(status.code(), None);
    assert_eq!(status.signal(), Some(Signal::SIGINT as i32));
}

#[test]
fn child_terminating_signal_is_reraised() {
    let tmp = tempfile::tempdir().unwrap();
    install_artifact(tmp.path(), "kill -TERM $$");

    let mut launcher = launch(tmp.path());
    let status = wait_for(&mut launcher);

    assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
}

#[test]
fn child_exit_code_is_propagated() {
    let tmp = tempfile::tempdir().unwrap();
    install_artifact(tmp.path(), "exit 5");

    let status = wait_for(&mut launch(tmp.path()));
    assert_eq!(status.code(), Some(5));
}

#[test]
fn missing_artifact_exits_one() {
    let tmp = tempfile::tempdir().unwrap();

    let status = wait_for(&mut launch(tmp.path()));
    assert_eq!(status.code(), Some(1));
}
