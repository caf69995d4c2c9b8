//! Integration tests for `gorilla-pipe` without a running service.

use serial_test::serial;
use std::process::{Command, Output};

fn gorilla_pipe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gorilla-pipe"));
    cmd.env_remove("GORILLA_UI_DEBUG")
        .env_remove("GORILLA_DEBUG")
        .env_remove("RUST_LOG");
    cmd
}

/// Generate a unique endpoint that nothing listens on.
///
/// On Unix, returns a socket path.
/// On Windows, returns a short pipe name.
fn test_endpoint() -> String {
    let unique_id = format!(
        "{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    );

    #[cfg(unix)]
    {
        std::env::temp_dir()
            .join(format!("gorilla-test-{unique_id}.sock"))
            .display()
            .to_string()
    }

    #[cfg(windows)]
    {
        format!("gorilla-test-{unique_id}")
    }
}

fn run(args: &[&str], endpoint: &str) -> Output {
    gorilla_pipe()
        .args(args)
        .env("GORILLA_PIPE_NAME", endpoint)
        .args(["--connect-timeout-ms", "500"])
        .output()
        .expect("Failed to run gorilla-pipe")
}

fn assert_connect_failure(output: &Output) {
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error:"),
        "Expected error message in stderr, got: {stderr}"
    );
    assert!(
        stderr.contains("Failed to connect"),
        "Expected connect failure in stderr, got: {stderr}"
    );
}

#[test]
#[serial]
fn test_list_without_service_fails() {
    let output = run(&["list"], &test_endpoint());
    assert_connect_failure(&output);
}

#[test]
#[serial]
fn test_install_without_service_fails() {
    let output = run(&["install", "Firefox"], &test_endpoint());
    assert_connect_failure(&output);
}

#[test]
#[serial]
fn test_stream_without_service_fails() {
    let output = run(&["stream", "op-42"], &test_endpoint());
    assert_connect_failure(&output);
}

#[test]
#[serial]
fn test_cache_show_without_file_prints_none() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("optional-installs-cache.json");

    let output = gorilla_pipe()
        .args(["--pipe", &test_endpoint(), "--cache-path"])
        .arg(&cache)
        .args(["cache", "show"])
        .output()
        .expect("Failed to run gorilla-pipe");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "none");
}

#[test]
#[serial]
fn test_cache_show_prints_persisted_document() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("optional-installs-cache.json");
    std::fs::write(
        &cache,
        r#"{"cachedAtUtc":"2026-02-14T18:12:00Z","items":[{"itemName":"VLC","status":"Installed","statusUpdatedAtUtc":"2026-02-14T18:10:00Z"}]}"#,
    )
    .unwrap();

    let output = gorilla_pipe()
        .args(["--pipe", &test_endpoint(), "--cache-path"])
        .arg(&cache)
        .args(["cache", "show"])
        .output()
        .expect("Failed to run gorilla-pipe");

    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["items"][0]["itemName"], "VLC");
}

#[test]
#[serial]
fn test_cache_refresh_failure_keeps_cached_document() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("optional-installs-cache.json");
    let original = r#"{"cachedAtUtc":"2026-02-14T18:12:00Z","items":[{"itemName":"VLC","status":"Installed","statusUpdatedAtUtc":"2026-02-14T18:10:00Z"}]}"#;
    std::fs::write(&cache, original).unwrap();

    let output = gorilla_pipe()
        .args(["--pipe", &test_endpoint(), "--cache-path"])
        .arg(&cache)
        .args(["--connect-timeout-ms", "500", "cache", "refresh"])
        .output()
        .expect("Failed to run gorilla-pipe");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("\"VLC\""),
        "Expected cached document, got: {stdout}"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: refresh failed"));
    assert_eq!(std::fs::read_to_string(&cache).unwrap(), original);
}

#[test]
#[serial]
fn test_diagnostics_log_file_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("logs").join("ui-client.log");

    let output = gorilla_pipe()
        .args(["--pipe", &test_endpoint(), "list"])
        .args(["--connect-timeout-ms", "500"])
        .env("GORILLA_UI_DEBUG", "1")
        .env("GORILLA_UI_LOG_PATH", &log)
        .output()
        .expect("Failed to run gorilla-pipe");

    assert!(!output.status.success());
    let contents = std::fs::read_to_string(&log).unwrap_or_default();
    assert!(
        !contents.is_empty(),
        "Expected diagnostic log at {}",
        log.display()
    );
}
