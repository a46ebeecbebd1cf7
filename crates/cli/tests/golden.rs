//! Golden tests for verifying JSON output format stability
//!
//! These cover paths that fail or finish before any store call, so they run
//! without an S3 endpoint.
//!
//! Run with: `cargo test --features golden`

#![cfg(feature = "golden")]

use std::process::{Command, Output};

use tempfile::TempDir;

/// Run the wsp binary with an isolated, empty config directory
fn run_wsp(args: &[&str]) -> Output {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    Command::new(env!("CARGO_BIN_EXE_wsp"))
        .args(args)
        .env("WSP_CONFIG_DIR", temp_dir.path())
        .env_remove("S3_BUCKET")
        .env_remove("S3_ENDPOINT")
        .output()
        .expect("Failed to execute wsp")
}

fn stderr_json(output: &Output) -> serde_json::Value {
    let stderr = String::from_utf8_lossy(&output.stderr);
    serde_json::from_str(&stderr).expect("stderr should be valid JSON")
}

#[test]
fn test_provision_missing_session_json() {
    let output = run_wsp(&["provision", "--template", "node", "--json"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    insta::assert_json_snapshot!(stderr_json(&output), @r#"
    {
      "error": "Validation failed: missing sessionId"
    }
    "#);
}

#[test]
fn test_provision_missing_both_json() {
    let output = run_wsp(&["provision", "--json"]);

    assert_eq!(output.status.code(), Some(2));
    insta::assert_json_snapshot!(stderr_json(&output), @r#"
    {
      "error": "Validation failed: missing sessionId and templateName"
    }
    "#);
}

#[test]
fn test_provision_blank_template_json() {
    let output = run_wsp(&["provision", "--session-id", "abc123", "--template", " ", "--json"]);

    assert_eq!(output.status.code(), Some(2));
    insta::assert_json_snapshot!(stderr_json(&output), @r#"
    {
      "error": "Validation failed: missing templateName"
    }
    "#);
}

#[test]
fn test_replicate_empty_source_json() {
    let output = run_wsp(&["replicate", "", "workspaces/abc123", "--json"]);

    assert_eq!(output.status.code(), Some(2));
    insta::assert_json_snapshot!(stderr_json(&output), @r#"
    {
      "error": "Validation failed: source prefix must not be empty"
    }
    "#);
}

#[test]
fn test_invalid_endpoint_json() {
    let output = run_wsp(&[
        "replicate",
        "templates/node",
        "workspaces/abc123",
        "--endpoint",
        "ftp://example.com",
        "--json",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let json = stderr_json(&output);
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to create S3 client: Configuration error"));
}

#[test]
fn test_completions_bash() {
    let output = run_wsp(&["completions", "bash"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wsp"));
    assert!(stdout.contains("provision"));
}
