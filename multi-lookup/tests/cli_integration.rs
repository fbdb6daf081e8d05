// multi-lookup/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Command isolated from the user's config files and ML_* environment
fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("multi-lookup").unwrap();
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join("xdg"))
        .env_remove("RUST_LOG");
    for var in [
        "ML_RESOLVERS",
        "ML_QUEUE_CAPACITY",
        "ML_TIMEOUT",
        "ML_NOT_FOUND",
        "ML_ALL_ADDRESSES",
        "ML_FAMILY",
        "ML_APPEND",
        "ML_CONFIG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Helper to create an input file of hostnames
fn create_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write input file");
    path
}

fn sorted_output(path: &Path) -> Vec<String> {
    let content = fs::read_to_string(path).expect("Output file missing");
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    lines.sort();
    lines
}

#[test]
fn test_no_arguments_prints_usage() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_single_argument_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1\n");

    cli(&dir)
        .arg(&input)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("required arguments were not provided"));
}

#[test]
fn test_help_lists_options() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--resolvers"))
        .stdout(predicate::str::contains("--queue-capacity"))
        .stdout(predicate::str::contains("--not-found"))
        .stdout(predicate::str::contains("<INPUTFILE>..."));
}

#[test]
fn test_resolves_address_literals() {
    let dir = TempDir::new().unwrap();
    let first = create_input(&dir, "names1.txt", "127.0.0.1\n::1\n");
    let second = create_input(&dir, "names2.txt", "192.0.2.44   10.1.2.3");
    let output = dir.path().join("results.txt");

    cli(&dir)
        .args(["-r", "2", "-q", "1"])
        .arg(&first)
        .arg(&second)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(
        sorted_output(&output),
        vec![
            "10.1.2.3,10.1.2.3",
            "127.0.0.1,127.0.0.1",
            "192.0.2.44,192.0.2.44",
            "::1,::1",
        ]
    );
}

#[test]
fn test_missing_input_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let good = create_input(&dir, "good.txt", "127.0.0.1");
    let output = dir.path().join("results.txt");

    cli(&dir)
        .arg(dir.path().join("missing.txt"))
        .arg(&good)
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("error opening input file"));

    assert_eq!(sorted_output(&output), vec!["127.0.0.1,127.0.0.1"]);
}

#[test]
fn test_unwritable_output_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1");

    cli(&dir)
        .arg(&input)
        .arg(dir.path().join("no-such-dir").join("results.txt"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Output file error"));
}

#[test]
fn test_family_filter_writes_marker() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1 ::1");
    let output = dir.path().join("results.txt");

    cli(&dir)
        .args(["-4", "--not-found", "MISSING"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        sorted_output(&output),
        vec!["127.0.0.1,127.0.0.1", "::1,MISSING"]
    );
}

#[test]
fn test_json_report_on_stdout() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1\n127.0.0.2\n127.0.0.3\n");
    let output = dir.path().join("results.txt");

    let assert = cli(&dir)
        .arg("--json")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is not JSON");
    assert_eq!(report["enqueued"], 3);
    assert_eq!(report["resolved"], 3);
    assert_eq!(report["written"], 3);
    assert_eq!(report["failed_inputs"], serde_json::json!([]));
}

#[test]
fn test_summary_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1");
    let output = dir.path().join("results.txt");

    cli(&dir)
        .arg("--summary")
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Resolved"))
        .stderr(predicate::str::contains("Hostnames"));
}

#[test]
fn test_invalid_queue_capacity() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1");

    cli(&dir)
        .args(["-q", "0"])
        .arg(&input)
        .arg(dir.path().join("results.txt"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Queue capacity must be between"));
}

#[test]
fn test_output_listed_as_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1");

    // Appending would feed results back into the requester reading the file
    for extra in [None, Some("--append")] {
        cli(&dir)
            .args(extra)
            .arg(&input)
            .arg(&input)
            .timeout(std::time::Duration::from_secs(30))
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("also an input file"));

        assert_eq!(fs::read_to_string(&input).unwrap(), "127.0.0.1");
    }
}

#[test]
fn test_append_flag_keeps_previous_results() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1");
    let output = dir.path().join("results.txt");
    fs::write(&output, "earlier.example,192.0.2.1\n").unwrap();

    cli(&dir)
        .arg("--append")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "earlier.example,192.0.2.1\n127.0.0.1,127.0.0.1\n"
    );
}

#[test]
fn test_config_file_integration() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "::1 127.0.0.1");
    let output = dir.path().join("results.txt");
    let config = create_input(
        &dir,
        "custom.toml",
        r#"
[defaults]
resolvers = 2
timeout = "2s"

[output]
not_found_marker = "NONE"
family = "v6"
"#,
    );

    cli(&dir)
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(sorted_output(&output), vec!["127.0.0.1,NONE", "::1,::1"]);
}

#[test]
fn test_invalid_explicit_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "127.0.0.1");
    let config = create_input(&dir, "broken.toml", "[defaults\nresolvers = ");

    cli(&dir)
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .arg(dir.path().join("results.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_config_file_discovery() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "::1");
    let output = dir.path().join("results.txt");
    create_input(
        &dir,
        "multi-lookup.toml",
        "[output]\nfamily = \"v4\"\nnot_found_marker = \"LOCAL\"\n",
    );

    cli(&dir).arg(&input).arg(&output).assert().success();

    assert_eq!(sorted_output(&output), vec!["::1,LOCAL"]);
}

#[test]
fn test_environment_variable_integration() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "::1");
    let output = dir.path().join("results.txt");

    cli(&dir)
        .env("ML_FAMILY", "v4")
        .env("ML_NOT_FOUND", "FROM_ENV")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(sorted_output(&output), vec!["::1,FROM_ENV"]);
}

#[test]
fn test_precedence_cli_over_env() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "::1");
    let output = dir.path().join("results.txt");

    cli(&dir)
        .env("ML_NOT_FOUND", "FROM_ENV")
        .args(["-4", "--not-found", "FROM_CLI"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(sorted_output(&output), vec!["::1,FROM_CLI"]);
}

#[test]
fn test_all_addresses_for_literal() {
    let dir = TempDir::new().unwrap();
    let input = create_input(&dir, "names.txt", "198.51.100.3");
    let output = dir.path().join("results.txt");

    cli(&dir)
        .arg("--all-addresses")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    assert_eq!(sorted_output(&output), vec!["198.51.100.3,198.51.100.3"]);
}
