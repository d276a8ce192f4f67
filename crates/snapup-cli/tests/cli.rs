//! Exit code behavior of the `snapup` binary.

use assert_cmd::Command;

fn snapup() -> Command {
    let mut cmd = Command::cargo_bin("snapup").unwrap();
    cmd.env_remove("SLIC3R_PP_OUTPUT_NAME").env_remove("RUST_LOG");
    cmd
}

#[test]
fn missing_file_argument_is_usage_error() {
    snapup().assert().code(1);
}

#[test]
fn help_exits_zero() {
    snapup().arg("--help").assert().success();
}

#[test]
fn directory_input_fails_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[session]\ncache_dir = {:?}\n",
            dir.path().join("cache").display().to_string()
        ),
    )
    .unwrap();

    snapup()
        .arg("--config")
        .arg(&config)
        .arg(dir.path())
        .assert()
        .code(255);
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    snapup()
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg(dir.path().join("nope.gcode"))
        .arg("127.0.0.1")
        .assert()
        .code(255);
}

#[test]
fn file_from_slicer_environment() {
    let dir = tempfile::tempdir().unwrap();
    // A directory in the slicer variable still goes through input validation.
    snapup()
        .env("SLIC3R_PP_OUTPUT_NAME", dir.path())
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .code(255);
}
