use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("peep")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_profile_help_shows_auth_code() {
    cargo_bin_cmd!("peep")
        .args(["profile", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("auth-code"));
}

#[test]
fn test_config_help_shows_subcommands() {
    cargo_bin_cmd!("peep")
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("path"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("peep")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
