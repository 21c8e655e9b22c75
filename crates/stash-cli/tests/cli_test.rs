//! End-to-end runs of the stash binary

use assert_cmd::Command;
use predicates::prelude::*;
use stash_testing::TestDir;

/// Command with its config and working directory pinned inside the test
/// directory.
fn stash(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("stash").unwrap();
    cmd.env("HOME", dir.path().join("home"));
    cmd.env("XDG_CONFIG_HOME", dir.path().join("xdg"));
    cmd.current_dir(dir.path());
    cmd
}

fn write_config(dir: &TestDir, contents: &str) {
    dir.create_file("xdg/stash/config.toml", contents.as_bytes());
    dir.create_file(
        "home/Library/Application Support/stash/config.toml",
        contents.as_bytes(),
    );
}

#[test]
fn pack_extract_list_round_trip() {
    let dir = TestDir::new();
    dir.create_file("data/a.txt", b"aaaaa");
    dir.create_file("data/sub/b.txt", b"bbbbb");

    stash(&dir)
        .args(["pack", "data", "-o", "backup.tar.gz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 entries"));

    stash(&dir)
        .args(["list", "backup.tar.gz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("data/a.txt"))
        .stdout(predicate::str::contains("data/sub/b.txt"));

    stash(&dir)
        .args(["extract", "backup.tar.gz", "-o", "restored"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 file(s)"));

    assert_eq!(
        std::fs::read(dir.path().join("restored/data/a.txt")).unwrap(),
        b"aaaaa"
    );
    assert_eq!(
        std::fs::read(dir.path().join("restored/data/sub/b.txt")).unwrap(),
        b"bbbbb"
    );
}

#[test]
fn info_reports_format_and_savings() {
    let dir = TestDir::new();
    dir.create_file("data/big.log", &b"all work and no play\n".repeat(256));

    stash(&dir)
        .args(["pack", "data", "-o", "data.zip"])
        .assert()
        .success();

    stash(&dir)
        .args(["info", "data.zip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Format:      zip"))
        .stdout(predicate::str::contains("Entries:     1"))
        .stdout(predicate::str::contains("Space saved:"));
}

#[test]
fn list_json_is_parseable() {
    let dir = TestDir::new();
    dir.create_file("data/a.txt", b"aaaaa");

    stash(&dir)
        .args(["pack", "data", "-o", "data.tar"])
        .assert()
        .success();

    let output = stash(&dir)
        .args(["list", "data.tar", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let entries: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let names: Vec<&str> = entries
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap().trim_end_matches('/'))
        .collect();
    assert!(names.contains(&"data/a.txt"));
}

#[test]
fn quiet_suppresses_the_summary() {
    let dir = TestDir::new();
    dir.create_file("data/a.txt", b"aaaaa");

    stash(&dir)
        .args(["pack", "data", "-o", "data.tar", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn missing_sources_exit_with_the_filesystem_code() {
    let dir = TestDir::new();
    stash(&dir)
        .args(["pack", "does-not-exist", "-o", "backup.tar"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Source not found"));
}

#[test]
fn unknown_formats_exit_with_the_usage_code() {
    let dir = TestDir::new();
    dir.create_file("data/a.txt", b"aaaaa");

    stash(&dir)
        .args(["pack", "data", "-o", "backup.rar"])
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("Unsupported format"));

    stash(&dir)
        .args(["pack", "data", "-o", "backup.tar", "-f", "lz4"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn missing_passwords_exit_with_the_auth_code() {
    let dir = TestDir::new();
    dir.create_file("data/a.txt", b"aaaaa");

    stash(&dir)
        .args(["pack", "data", "-o", "secret.zip", "-p", "hunter2"])
        .assert()
        .success();

    stash(&dir)
        .args(["extract", "secret.zip", "-o", "out"])
        .assert()
        .failure()
        .code(5)
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn compression_level_changes_the_output_size() {
    let dir = TestDir::new();
    dir.create_file("corpus.txt", &b"the quick brown fox\n".repeat(512));

    stash(&dir)
        .args(["pack", "corpus.txt", "-o", "fast.gz", "-f", "gz", "-l", "0"])
        .assert()
        .success();
    stash(&dir)
        .args(["pack", "corpus.txt", "-o", "best.gz", "-f", "gz", "-l", "9"])
        .assert()
        .success();

    let fast = std::fs::metadata(dir.path().join("fast.gz")).unwrap().len();
    let best = std::fs::metadata(dir.path().join("best.gz")).unwrap().len();
    assert!(best < fast);
}

#[test]
fn extract_select_limits_what_is_restored() {
    let dir = TestDir::new();
    dir.create_file("data/keep.txt", b"keep");
    dir.create_file("data/skip.md", b"skip");

    stash(&dir)
        .args(["pack", "data", "-o", "data.zip"])
        .assert()
        .success();

    stash(&dir)
        .args(["extract", "data.zip", "-o", "out", "--select", "*.txt"])
        .assert()
        .success();
    assert!(dir.path().join("out/data/keep.txt").is_file());
    assert!(!dir.path().join("out/data/skip.md").exists());
}

#[test]
fn configured_default_format_covers_unknown_names() {
    let dir = TestDir::new();
    write_config(&dir, "default_format = \"tar.gz\"\n");
    dir.create_file("data/a.txt", b"aaaaa");

    stash(&dir)
        .args(["pack", "data", "-o", "backup"])
        .assert()
        .success();

    stash(&dir)
        .args(["list", "backup", "-f", "tar.gz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("data/a.txt"));
}

#[test]
fn config_command_prints_the_location() {
    let dir = TestDir::new();
    stash(&dir)
        .args(["config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}
