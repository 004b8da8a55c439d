//! CLI Integration Tests
//!
//! Runs the `gmt-clib` binary for the paths that do not need a GMT
//! installation.

use std::process::Command;

fn gmt_clib() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gmt-clib"))
}

#[test]
fn test_help_lists_subcommands() {
    let output = gmt_clib().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["info", "constant", "call"] {
        assert!(stdout.contains(command), "missing {} in:\n{}", command, stdout);
    }
}

#[test]
fn test_missing_config_file() {
    let output = gmt_clib()
        .args(["--config", "/nonexistent/gmt-clib.toml", "info"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config file not found"), "stderr:\n{}", stderr);
}

#[test]
fn test_call_requires_module() {
    let output = gmt_clib().arg("call").output().unwrap();
    assert!(!output.status.success());
}
