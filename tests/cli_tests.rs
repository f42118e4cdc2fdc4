use regex::Regex;
use std::path::Path;
use std::process::{Command, Output};

const SCENARIO_SCRIPT: &str = "fist:2.0333,palm:2.6";

fn gesturegate(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gesturegate"))
        .args(args)
        .output()
        .expect("failed to run gesturegate")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).to_string()
}

/// Writes a trace that holds a fist for 2.5 s at the given confidence.
fn write_fist_trace(path: &Path, confidence: f32) {
    let mut csv = String::from("time_s,label,confidence\n");
    for k in 0..75u32 {
        csv.push_str(&format!("{:.6},fist,{}\n", k as f64 / 30.0, confidence));
    }
    std::fs::write(path, csv).unwrap();
}

#[test]
fn test_replay_prints_tables() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("trace.csv");
    write_fist_trace(&trace, 0.9);

    let out = gesturegate(&["replay", "--trace", trace.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let text = stdout(&out);
    assert!(text.contains("=== CONFIRMED GESTURES ==="));
    assert!(text.contains("=== LEVEL EVALUATION ==="));
    assert!(text.contains("VALID"));
    assert!(Regex::new(r"Replayed 75 frames at level 6; 1 action\(s\) delivered")
        .unwrap()
        .is_match(&text));
}

#[test]
fn test_replay_json_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("trace.csv");
    write_fist_trace(&trace, 0.6);

    let out = gesturegate(&["replay", "--json", "-t", trace.to_str().unwrap(), "-l", "8"]);
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["level"], 8);
    assert_eq!(report["frames"], 75);
    assert_eq!(report["confirmations"].as_array().unwrap().len(), 1);
    assert_eq!(report["confirmations"][0]["valid"], false);
    assert!(report["actions"].as_array().unwrap().is_empty());
}

#[test]
fn test_simulate_saves_trace_and_delivers_actions() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("synthetic.csv");

    let out = gesturegate(&[
        "simulate",
        "--json",
        "--script",
        SCENARIO_SCRIPT,
        "--save-trace",
        saved.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["actions"], serde_json::json!(["fist", "palm"]));

    let csv = std::fs::read_to_string(&saved).unwrap();
    assert!(csv.starts_with("time_s,label,confidence\n"));
    assert_eq!(csv.lines().count(), 1 + report["frames"].as_u64().unwrap() as usize);
}

#[test]
fn test_simulate_through_landmark_pipeline() {
    let out = gesturegate(&[
        "simulate",
        "--json",
        "--landmarks",
        "--script",
        SCENARIO_SCRIPT,
        "--seed",
        "3",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["actions"], serde_json::json!(["fist", "palm"]));
}

#[test]
fn test_sweep_covers_every_level() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("trace.csv");
    write_fist_trace(&trace, 0.6);

    let out = gesturegate(&["sweep", "--trace", trace.to_str().unwrap()]);
    assert!(out.status.success());

    let text = stdout(&out);
    assert!(text.contains("=== LEVEL SWEEP ==="));
    let row = Regex::new(r"\|\s*(\d)\s*\|\s*(\d+)%").unwrap();
    let levels: Vec<String> = row
        .captures_iter(&text)
        .map(|c| c[1].to_string())
        .collect();
    assert_eq!(levels, vec!["4", "5", "6", "7", "8"]);
}

#[test]
fn test_config_file_is_merged_under_flags() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("trace.csv");
    write_fist_trace(&trace, 0.9);

    // A 3 s dwell never completes within the 2.5 s trace
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{ "confirm": { "dwell_time_secs": 3.0 } }"#).unwrap();

    let out = gesturegate(&[
        "replay",
        "--json",
        "--config",
        config.to_str().unwrap(),
        "--trace",
        trace.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert!(report["confirmations"].as_array().unwrap().is_empty());

    // The flag wins over the file: confirmations at 0.5 s and 1.5 s
    let out = gesturegate(&[
        "replay",
        "--json",
        "--config",
        config.to_str().unwrap(),
        "--dwell-time-secs",
        "0.5",
        "--trace",
        trace.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_str(&stdout(&out)).unwrap();
    assert_eq!(report["confirmations"].as_array().unwrap().len(), 2);
}

#[test]
fn test_missing_trace_fails() {
    let out = gesturegate(&["replay", "--trace", "/definitely/not/here.csv"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("❌"));
}

#[test]
fn test_invalid_config_flag_fails() {
    let out = gesturegate(&["simulate", "--script", "fist:1.0", "--min-stable-frames", "50"]);
    assert!(!out.status.success());
}

#[test]
fn test_unrepresentable_dwell_fails_cleanly() {
    let out = gesturegate(&["simulate", "--script", "fist:1.0", "--dwell-time-secs", "1e30"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("dwell_time_secs"));
}
