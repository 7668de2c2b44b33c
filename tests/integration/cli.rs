//! End-to-end tests of the slugkit binary against a mock server

use assert_cmd::Command;
use httpmock::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn slugkit() -> Command {
    let mut cmd = Command::cargo_bin("slugkit").unwrap();
    cmd.env_remove("SLUGKIT_BASE_URL")
        .env_remove("SLUGKIT_API_KEY")
        .env_remove("SLUGKIT_TIMEOUT_SECS")
        .env("RUST_LOG", "slugkit=warn");
    cmd
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_lists_commands() {
    let output = slugkit().arg("--help").output().unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["forge", "mint", "slice", "series-info", "dictionary-tags"] {
        assert!(text.contains(command), "help is missing {command}");
    }
}

#[test]
fn test_missing_base_url_fails() {
    slugkit().args(["ping"]).assert().failure().code(1);
}

#[test]
fn test_max_retries_out_of_range_is_rejected() {
    slugkit()
        .args(["--base-url", "http://127.0.0.1:9", "--max-retries", "0", "ping"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_forge_prints_identifiers() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/gen/forge")
            .header("x-api-key", "cli-key")
            .json_body(json!({"pattern": "{noun}", "seed": "fixed", "count": 2}));
        then.status(200).json_body(json!(["otter", "badger"]));
    });

    let output = slugkit()
        .env("SLUGKIT_BASE_URL", server.base_url())
        .env("SLUGKIT_API_KEY", "cli-key")
        .args(["forge", "{noun}", "--seed", "fixed", "--count", "2"])
        .output()
        .unwrap();

    mock.assert();
    assert!(output.status.success());
    assert_eq!(stdout(&output), "otter\nbadger\n");
}

#[test]
fn test_forge_without_key_fails() {
    let server = MockServer::start();
    let base_url = server.base_url();

    slugkit()
        .args(["--base-url", base_url.as_str(), "forge", "{noun}"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_mint_writes_output_file() {
    let server = MockServer::start();
    let base_url = server.base_url();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/gen/mint/stream")
            .json_body(json!({"count": 3, "series": "orders"}));
        then.status(200).body("a-1\na-2\na-3\n");
    });
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("ids.txt");

    slugkit()
        .args([
            "--base-url",
            base_url.as_str(),
            "--api-key",
            "cli-key",
            "mint",
            "3",
            "--series",
            "orders",
            "--output",
            path.to_str().unwrap(),
        ])
        .assert()
        .success();

    mock.assert();
    assert_eq!(fs::read_to_string(&path).unwrap(), "a-1\na-2\na-3\n");
}

#[test]
fn test_slice_json_output() {
    let server = MockServer::start();
    let base_url = server.base_url();
    server.mock(|when, then| {
        when.method(POST)
            .path("/gen/slice/stream")
            .json_body(json!({"count": 2, "sequence": 10}));
        then.status(200).body("x-10\nx-11\n");
    });

    let output = slugkit()
        .args([
            "--base-url",
            base_url.as_str(),
            "--api-key",
            "cli-key",
            "-o",
            "json",
            "slice",
            "10",
            "2",
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let ids: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(ids, vec!["x-10", "x-11"]);
}

#[test]
fn test_limits_text_output() {
    let server = MockServer::start();
    let base_url = server.base_url();
    server.mock(|when, then| {
        when.method(GET).path("/limits");
        then.status(200)
            .json_body(json!({"plan": "free", "req_per_minute": 60, "max_series": 0}));
    });

    let output = slugkit()
        .args(["--base-url", base_url.as_str(), "limits"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Plan                     : free"));
    assert!(text.contains("Max series               : 0"));
    assert!(text.contains("Requests per day         : not available"));
}

#[test]
fn test_server_error_exits_with_failure() {
    let server = MockServer::start();
    let base_url = server.base_url();
    server.mock(|when, then| {
        when.method(GET).path("/ping");
        then.status(500).body("boom");
    });

    let output = slugkit()
        .args(["--base-url", base_url.as_str(), "ping"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
