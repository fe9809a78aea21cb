//! Contract tests against the compiled binary: flags, exit codes and
//! the headless frame stream.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

fn corewake() -> Command {
    Command::new(env!("CARGO_BIN_EXE_corewake"))
}

fn write_settings(path: &Path, json: &str) {
    fs::write(path, json).expect("settings file should write");
}

#[test]
fn headless_loading_run_streams_png_and_exits_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let settings = dir.path().join("settings.json");
    write_settings(&settings, "{ \"fps\": 30, \"loading_seconds\": 0.05 }");

    let output = corewake()
        .args(["--headless", "--phases", "loading", "--settings"])
        .arg(&settings)
        .stdin(Stdio::null())
        .output()
        .expect("corewake should run");

    assert!(
        output.status.success(),
        "expected clean exit, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        output.stdout.len() > 8 && output.stdout[..8] == PNG_SIGNATURE,
        "stdout should begin with a PNG signature"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[corewake]"), "status lines go to stderr");
}

#[test]
fn quit_token_stops_an_unfinishable_phase() {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let settings = dir.path().join("settings.json");
    write_settings(&settings, "{ \"fps\": 30 }");

    let mut child = corewake()
        .args(["--headless", "--phases", "checksum", "--settings"])
        .arg(&settings)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("corewake should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(b"quit\n")
        .expect("quit token should write");

    let output = child.wait_with_output().expect("corewake should exit");
    assert!(
        output.status.success(),
        "QUIT must exit 0, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn missing_portrait_assets_are_fatal_at_startup() {
    let dir = tempfile::tempdir().expect("tempdir should create");

    let output = corewake()
        .args(["--headless", "--phases", "intro", "--assets"])
        .arg(dir.path())
        .stdin(Stdio::null())
        .output()
        .expect("corewake should run");

    assert!(!output.status.success(), "missing assets must be fatal");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("portrait"),
        "diagnostic should name the missing portraits, got: {stderr}"
    );
}

#[test]
fn invalid_settings_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir should create");
    let settings = dir.path().join("settings.json");
    write_settings(&settings, "{ \"fps\": 0 }");

    let output = corewake()
        .args(["--headless", "--phases", "loading", "--settings"])
        .arg(&settings)
        .stdin(Stdio::null())
        .output()
        .expect("corewake should run");

    assert!(!output.status.success());
}

#[test]
fn unknown_phase_name_is_a_usage_error() {
    let output = corewake()
        .args(["--headless", "--phases", "bonus-level"])
        .stdin(Stdio::null())
        .output()
        .expect("corewake should run");
    assert!(!output.status.success());
}
