//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify its outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_breathwork"))
        .args(args)
        .env("BREATHWORK_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "CLI command failed {:?}: {}", args, stderr);
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_protocol_defaults_to_week_one() {
    let dir = tempfile::tempdir().unwrap();
    let view = run_json(dir.path(), &["protocol", "show"]);
    assert_eq!(view["week"]["week"], 1);
    assert_eq!(view["week"]["focus"], "Foundation");
    assert_eq!(view["pattern"]["inhale"], 4.0);
    assert_eq!(view["calibration"]["complete"], false);
}

#[test]
fn test_protocol_set_and_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let event = run_json(dir.path(), &["protocol", "set", "6"]);
    assert_eq!(event["type"], "WeekChanged");
    assert_eq!(event["pattern"]["inhaleHold"], 3.0);

    let view = run_json(dir.path(), &["protocol", "show"]);
    assert_eq!(view["week"]["week"], 6);

    let (_, stderr, code) = run_cli(dir.path(), &["protocol", "set", "11"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("out of range"));
}

#[test]
fn test_protocol_next_stops_at_final_week() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["protocol", "set", "10"]);
    let (_, stderr, code) = run_cli(dir.path(), &["protocol", "next"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("final week"));
}

#[test]
fn test_protocol_rejects_invalid_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["protocol", "pattern", "0", "6"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid breath pattern"));
}

#[test]
fn test_session_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let started = run_json(dir.path(), &["session", "start", "--kind", "quick"]);
    assert_eq!(started["type"], "SessionStarted");
    assert_eq!(started["target_secs"], 300);

    let (_, _, code) = run_cli(dir.path(), &["session", "start"]);
    assert_ne!(code, 0, "second start should be refused");

    let status = run_json(dir.path(), &["session", "status"]);
    assert_eq!(status["type"], "StateSnapshot");
    assert_eq!(status["state"], "running");

    let paused = run_json(dir.path(), &["session", "pause"]);
    assert_eq!(paused["type"], "SessionPaused");
    let (_, _, code) = run_cli(dir.path(), &["session", "pause"]);
    assert_ne!(code, 0);

    let resumed = run_json(dir.path(), &["session", "resume"]);
    assert_eq!(resumed["type"], "SessionResumed");

    let ended = run_json(dir.path(), &["session", "end"]);
    assert_eq!(ended["type"], "SessionEnded");
    assert_eq!(ended["record"]["kind"], "quick");
    assert_eq!(ended["streak"], 1);

    let history = run_json(dir.path(), &["history", "list"]);
    assert_eq!(history.as_array().unwrap().len(), 1);

    let streak = run_json(dir.path(), &["streak"]);
    assert_eq!(streak["streak"], 1);

    let stats = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(stats["total_sessions"], 1);
}

#[test]
fn test_session_end_without_active_session() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["session", "end"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no active session"));
}

#[test]
fn test_breathe_zero_minutes_records_session() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &["breathe", "--minutes", "0", "--json"]);
    assert_eq!(code, 0, "breathe failed: {stderr}");
    assert!(stdout.contains("SessionStarted"));
    assert!(stdout.contains("SessionEnded"));

    let history = run_json(dir.path(), &["history", "list", "--limit", "5"]);
    assert_eq!(history[0]["kind"], "custom");
}

#[test]
fn test_calibrate_stores_result() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "calibration.duration_secs", "0"]);
    let (stdout, stderr, code) = run_cli(dir.path(), &["calibrate"]);
    assert_eq!(code, 0, "calibrate failed: {stderr}");
    assert!(stdout.contains("CalibrationCompleted"));

    let view = run_json(dir.path(), &["protocol", "show"]);
    assert_eq!(view["calibration"]["complete"], true);
    assert_eq!(view["calibration"]["rate"], 5);
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "settings.sound"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "false");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "settings.sound", "true"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "settings.sound"]);
    assert_eq!(stdout.trim(), "true");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "settings.nope", "1"]);
    assert_ne!(code, 0);
}

#[test]
fn test_hrv_show_with_export() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("oura.json");
    std::fs::write(
        &export,
        r#"{"data":[{"day":"2026-01-01","score":70},{"day":"2026-01-02","score":90}]}"#,
    )
    .unwrap();

    let view = run_json(
        dir.path(),
        &["hrv", "show", "--file", export.to_str().unwrap()],
    );
    assert_eq!(view["days"].as_array().unwrap().len(), 2);
    assert_eq!(view["summary"]["session_days"], 0);
    assert_eq!(view["summary"]["mean_readiness_without_session"], 80.0);
}

#[test]
fn test_hrv_requires_source() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["hrv", "show"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no HRV export configured"));
}
