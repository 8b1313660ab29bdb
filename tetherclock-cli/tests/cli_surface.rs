//! End-to-end checks of the CLI surface that need no attached device.

use assert_cmd::Command;
use predicates::prelude::*;

fn tetherclock() -> Command {
    Command::cargo_bin("tetherclock").expect("binary")
}

#[test]
fn help_lists_commands_and_environment() {
    tetherclock()
        .arg("help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("oneshot")
                .and(predicate::str::contains("resync"))
                .and(predicate::str::contains("device"))
                .and(predicate::str::contains("reset"))
                .and(predicate::str::contains("DISCOVERY_INTERVAL"))
                .and(predicate::str::contains("STARTUP_WINDOW")),
        );
}

#[test]
fn version_prints() {
    tetherclock()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tetherclock"));
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    tetherclock().arg("frobnicate").assert().failure();
}

#[test]
fn missing_bridge_tool_exits_127() {
    let empty_path = tempfile::TempDir::new().expect("tempdir");
    tetherclock()
        .arg("list")
        .env("PATH", empty_path.path())
        .assert()
        .code(127)
        .stderr(predicate::str::contains("not found on PATH"));
}

#[cfg(target_os = "linux")]
#[test]
fn reset_clears_the_persisted_selection() {
    let config_home = tempfile::TempDir::new().expect("tempdir");
    let app_dir = config_home.path().join("tetherclock");
    std::fs::create_dir_all(&app_dir).expect("mkdir");
    let config_file = app_dir.join("config.json");
    std::fs::write(&config_file, r#"{"selected_serial":"R58M12ABCDE"}"#).expect("write");

    tetherclock()
        .arg("reset")
        .env("XDG_CONFIG_HOME", config_home.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration cleared"));

    assert!(!config_file.exists(), "reset removes the config file");
}

#[cfg(target_os = "linux")]
#[test]
fn reset_succeeds_when_nothing_was_persisted() {
    let config_home = tempfile::TempDir::new().expect("tempdir");
    tetherclock()
        .arg("reset")
        .env("XDG_CONFIG_HOME", config_home.path())
        .assert()
        .success();
}
