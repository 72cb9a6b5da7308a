//! Integration tests for the command-line binary
//!
//! Only paths that never touch the network are exercised here.

use std::process::Command;

use chrono::Local;
use covid_tracker::cache::SnapshotStore;
use covid_tracker::data::Category;
use tempfile::TempDir;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_covid-tracker"))
        .args(args)
        .env_remove("COVID_CACHE_DIR")
        .env_remove("COVID_API_URL")
        .output()
        .expect("Failed to execute covid-tracker")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("covid-tracker"), "Help should mention the binary");
    assert!(stdout.contains("--cache-dir"), "Help should mention --cache-dir");
    assert!(stdout.contains("--country"), "Help should mention --country");
}

#[test]
fn test_invalid_country_prints_error_and_exits() {
    let output = run_cli(&["--country", "../etc", "--no-progress"]);
    assert!(!output.status.success(), "Expected invalid country to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid country slug"),
        "Should explain the bad slug: {}",
        stderr
    );
}

#[test]
fn test_zero_top_is_rejected() {
    let output = run_cli(&["--top", "0", "--status"]);
    assert!(!output.status.success());
}

#[test]
fn test_status_with_empty_cache() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let dir = temp_dir.path().join("medicoes");

    let output = run_cli(&["--status", "--cache-dir", dir.to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No cached snapshots"), "Got: {}", stdout);
}

#[test]
fn test_status_lists_todays_snapshot_as_fresh() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = SnapshotStore::with_dir(temp_dir.path());
    let today = Local::now().date_naive();
    for category in Category::ALL {
        store.save(category, today, &[]).expect("Write should succeed");
    }

    let output = run_cli(&["--status", "--cache-dir", temp_dir.path().to_str().unwrap()]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&today.to_string()), "Got: {}", stdout);
    assert!(stdout.contains("(fresh)"), "Got: {}", stdout);
}
