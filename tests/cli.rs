//! Integration tests for the `ggp` binary.
//!
//! Every test points HOME and the config variable at a scratch directory so
//! the user's own configuration never leaks in.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// A `ggp` command isolated from the user's configuration.
fn ggp(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ggp").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env("GEOGIG_PORCELAIN_CONFIG", home.child("none.toml").path());
    cmd
}

#[test]
fn help_names_the_tool() {
    let home = TempDir::new().unwrap();
    ggp(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("GeoGig"))
        .stdout(predicate::str::contains("merge"));
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    ggp(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ggp"));
}

#[test]
fn merge_help_explains_conflicts() {
    let home = TempDir::new().unwrap();
    ggp(&home)
        .args(["merge", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ggp resolve"));
}

#[test]
fn log_outside_repository_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    ggp(&home)
        .arg("--cwd")
        .arg(dir.path())
        .arg("log")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a repository"));
}

#[test]
fn resolve_requires_a_side() {
    let home = TempDir::new().unwrap();
    ggp(&home)
        .args(["resolve", "parks/5"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--ours"));
}

#[test]
fn init_rejects_malformed_params() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    ggp(&home)
        .arg("--cwd")
        .arg(dir.path())
        .args(["init", "-p", "rocksdb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key=value"));
}

#[test]
fn init_reports_missing_engine() {
    let home = TempDir::new().unwrap();
    let config = home.child("config.toml");
    config.write_str("engine = \"/nonexistent/bin/geogig\"\n").unwrap();
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("ggp")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env("GEOGIG_PORCELAIN_CONFIG", config.path())
        .arg("--cwd")
        .arg(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to initialize repository"));
}

#[test]
fn config_show_prints_defaults() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    ggp(&home)
        .arg("--cwd")
        .arg(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("engine"))
        .stdout(predicate::str::contains("geogig"))
        .stdout(predicate::str::contains("origin"));
}

#[test]
fn config_show_as_json_reads_repo_file() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    dir.child(".geogig/porcelain.toml")
        .write_str("remote = \"upstream\"\ntimestamps = \"epoch\"\n")
        .unwrap();

    ggp(&home)
        .arg("--cwd")
        .arg(dir.path())
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"remote\": \"upstream\""))
        .stdout(predicate::str::contains("\"timestamps\": \"epoch\""))
        .stdout(predicate::str::contains("\"transport\": \"process\""));
}
