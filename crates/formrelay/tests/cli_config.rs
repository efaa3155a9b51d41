//! `formrelay config` subcommands keep working when the active config file is broken.

use std::path::Path;
use std::process::{Command, Output};

fn formrelay(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_formrelay"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write(path: &Path, contents: &str) -> String {
    std::fs::write(path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn test_config_path_ignores_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(&dir.path().join("broken.toml"), "[relay\nport = ");

    let output = formrelay(&["--config", &broken, "config", "path"]);

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), broken);
}

#[test]
fn test_config_validate_other_file_ignores_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(&dir.path().join("broken.toml"), "[relay\nport = ");
    let good = write(&dir.path().join("good.toml"), "[http]\nport = 8080\n");

    let output = formrelay(&["--config", &broken, "config", "validate", "--file", &good]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration is valid."));
}

#[test]
fn test_config_validate_reports_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(&dir.path().join("broken.toml"), "[relay]\nbuffer_size = 0\n");

    let output = formrelay(&["config", "validate", "--file", &broken]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Configuration error"));
}

#[test]
fn test_config_show_fails_on_broken_file() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write(&dir.path().join("broken.toml"), "[relay]\nbuffer_size = 0\n");

    let output = formrelay(&["--config", &broken, "config", "show"]);

    assert!(!output.status.success());
}
