//! CLI smoke tests: the binary parses its surface and the settings file
//! round-trips through the `status` and `config` commands.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn reelbot(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("reelbot").expect("binary builds");
    cmd.env("REELBOT_CONFIG", config_dir.path().join("config.toml"));
    cmd
}

#[test]
fn help_lists_the_commands() {
    let temp = TempDir::new().unwrap();
    reelbot(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upgrade"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn status_reports_the_default_version() {
    let temp = TempDir::new().unwrap();
    reelbot(&temp)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("1.0.0"))
        .stdout(predicate::str::contains("Last update:     never"));
}

#[test]
fn config_set_round_trips_through_show() {
    let temp = TempDir::new().unwrap();
    reelbot(&temp)
        .args(["config", "set", "github_repo", "acme/bot"])
        .assert()
        .success();
    reelbot(&temp)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("github_repo = \"acme/bot\""));
}

#[test]
fn config_set_rejects_unknown_keys() {
    let temp = TempDir::new().unwrap();
    reelbot(&temp)
        .args(["config", "set", "no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown setting"));
}

#[test]
fn config_set_rejects_bad_repo() {
    let temp = TempDir::new().unwrap();
    reelbot(&temp)
        .args(["config", "set", "github_repo", "not-a-repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("owner/name"));
}
