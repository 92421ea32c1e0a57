//! Integration tests for Pacer CLI commands.
//!
//! Uses tempfile for testing file-based operations.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use pacer::cli::{cmd_settle, cmd_simulate, CliError, Policy};
use pacer_core::Edge;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Create a temporary directory for tests.
fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Write a timeline JSON file (call instants in milliseconds).
fn create_timeline(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("timeline.json");
    std::fs::write(&path, content).unwrap();
    path
}

/// Write a settlement batch JSON file.
fn create_batch(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("batch.json");
    std::fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// SIMULATE COMMAND TESTS
// =============================================================================

#[test]
fn test_simulate_debounce_trailing_example() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "[0, 100, 250]");

    let output = cmd_simulate(&timeline, Policy::Debounce, 300, Edge::Trailing, false, false)
        .unwrap();

    assert!(output.contains("fired at t=550 with call #2's arguments"));
    assert!(output.contains("calls: 3, firings: 1"));
}

#[test]
fn test_simulate_debounce_leading_fires_first_call() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "[0, 100, 250]");

    let output = cmd_simulate(&timeline, Policy::Debounce, 300, Edge::Leading, false, false)
        .unwrap();

    assert!(output.contains("fired at t=0 with call #0's arguments"));
    assert!(output.contains("calls: 3, firings: 1"));
}

#[test]
fn test_simulate_throttle_leading_example() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "[0, 200, 1100]");

    let output = cmd_simulate(&timeline, Policy::Throttle, 1000, Edge::Trailing, false, false)
        .unwrap();

    assert!(output.contains("fired at t=0 with call #0's arguments"));
    assert!(output.contains("fired at t=1100 with call #2's arguments"));
    assert!(output.contains("calls: 3, firings: 2"));
}

#[test]
fn test_simulate_throttle_trailing_defers_latest_call() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "[0, 200, 400]");

    let output = cmd_simulate(&timeline, Policy::Throttle, 1000, Edge::Trailing, true, false)
        .unwrap();

    assert!(output.contains("fired at t=0 with call #0's arguments"));
    assert!(output.contains("fired at t=1000 with call #2's arguments"));
}

#[test]
fn test_simulate_json_output_parses() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "[0, 100, 250]");

    let output = cmd_simulate(&timeline, Policy::Debounce, 300, Edge::Trailing, false, true)
        .unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["calls"], 3);
    assert_eq!(report["firings"][0]["at"], 550);
    assert_eq!(report["firings"][0]["call_index"], 2);
}

#[test]
fn test_simulate_rejects_unsorted_timeline() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "[100, 50]");

    let result = cmd_simulate(&timeline, Policy::Debounce, 300, Edge::Trailing, false, false);
    assert!(matches!(result, Err(CliError::Replay(_))));
}

#[test]
fn test_simulate_rejects_zero_window() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "[0, 100]");

    let result = cmd_simulate(&timeline, Policy::Throttle, 0, Edge::Trailing, false, false);
    assert!(matches!(result, Err(CliError::Policy(_))));
}

#[test]
fn test_simulate_missing_file_is_io_error() {
    let temp = create_temp_dir();
    let missing = temp.path().join("nope.json");

    let result = cmd_simulate(&missing, Policy::Debounce, 300, Edge::Trailing, false, false);
    assert!(matches!(result, Err(CliError::Io { .. })));
}

#[test]
fn test_simulate_rejects_malformed_json() {
    let temp = create_temp_dir();
    let timeline = create_timeline(&temp, "not json");

    let result = cmd_simulate(&timeline, Policy::Debounce, 300, Edge::Trailing, false, false);
    assert!(matches!(result, Err(CliError::Json { .. })));
}

// =============================================================================
// SETTLE COMMAND TESTS
// =============================================================================

#[tokio::test]
async fn test_settle_reports_slots_in_input_order() {
    let temp = create_temp_dir();
    // The first slot finishes last; output order must not change.
    let batch = create_batch(
        &temp,
        r#"[
            {"label": "users", "delay_ms": 30, "value": 1},
            {"label": "orders", "delay_ms": 10, "error": "backend down"},
            {"label": "stock", "value": 3}
        ]"#,
    );

    let output = cmd_settle(&batch, false).await.unwrap();
    let users = output.find("slot 0 [users]: fulfilled: 1").unwrap();
    let orders = output.find("slot 1 [orders]: failed: backend down").unwrap();
    let stock = output.find("slot 2 [stock]: fulfilled: 3").unwrap();

    assert!(users < orders && orders < stock);
    assert!(output.contains("settled 3 slots: 2 fulfilled, 1 failed (66% ok)"));
}

#[tokio::test]
async fn test_settle_json_report() {
    let temp = create_temp_dir();
    let batch = create_batch(
        &temp,
        r#"[
            {"label": "a", "value": 1},
            {"label": "b", "error": "e"}
        ]"#,
    );

    let output = cmd_settle(&batch, true).await.unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["slots"][0]["label"], "a");
    assert_eq!(report["slots"][0]["status"], "fulfilled");
    assert_eq!(report["slots"][0]["value"], 1);
    assert_eq!(report["slots"][1]["status"], "failed");
    assert_eq!(report["slots"][1]["error"], "e");
    assert_eq!(report["stats"]["total"], 2);
    assert_eq!(report["stats"]["failed"], 1);
}

#[tokio::test]
async fn test_settle_empty_batch() {
    let temp = create_temp_dir();
    let batch = create_batch(&temp, "[]");

    let output = cmd_settle(&batch, false).await.unwrap();
    assert!(output.contains("settled 0 slots: 0 fulfilled, 0 failed (0% ok)"));
}

#[tokio::test]
async fn test_settle_rejects_slot_with_both_outcomes() {
    let temp = create_temp_dir();
    let batch = create_batch(
        &temp,
        r#"[{"label": "x", "value": 1, "error": "e"}]"#,
    );

    let result = cmd_settle(&batch, false).await;
    assert!(matches!(result, Err(CliError::AmbiguousSlot { label }) if label == "x"));
}

#[tokio::test]
async fn test_settle_rejects_slot_with_no_outcome() {
    let temp = create_temp_dir();
    let batch = create_batch(&temp, r#"[{"label": "y"}]"#);

    let result = cmd_settle(&batch, false).await;
    assert!(matches!(result, Err(CliError::AmbiguousSlot { label }) if label == "y"));
}
