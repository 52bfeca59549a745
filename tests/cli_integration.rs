mod common;

use std::process::Command;

use chrono::NaiveDate;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_solar-storage-sim"))
}

#[test]
fn clean_then_simulate_writes_trajectory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).expect("date");
    let raw = common::write_file(dir.path(), "raw.csv", &common::raw_csv(start, 3));
    let cleaned = dir.path().join("cleaned.csv");

    let output = bin()
        .args(["clean", "--input"])
        .arg(&raw)
        .arg("--output")
        .arg(&cleaned)
        .output()
        .expect("clean should run");
    assert!(
        output.status.success(),
        "clean failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = std::fs::read_to_string(&cleaned).expect("cleaned file");
    assert!(text.starts_with("Time,Pprod(W),Pdemand(W),Pimb\n"));
    assert_eq!(text.lines().count(), 3 * 24 + 1);

    let soc = dir.path().join("soc.csv");
    let output = bin()
        .args(["simulate", "--input"])
        .arg(&cleaned)
        .args(["--capacity-wh", "20000", "--initial-percent", "50"])
        .arg("--telemetry-out")
        .arg(&soc)
        .output()
        .expect("simulate should run");
    assert!(
        output.status.success(),
        "simulate failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let rows = std::fs::read_to_string(&soc).expect("trajectory file");
    assert_eq!(rows.lines().count(), 3 * 24 + 1);
    assert!(rows.starts_with("time,net_wh,state_wh,state_percent,export_wh,import_wh\n"));
}

#[test]
fn analyze_exits_non_zero_when_an_analysis_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let start = NaiveDate::from_ymd_opt(2023, 6, 1).expect("date");
    let raw = common::write_file(dir.path(), "june.csv", &common::raw_csv(start, 5));
    let out = dir.path().join("out");

    let output = bin()
        .args(["analyze", "--raw", "--input"])
        .arg(&raw)
        .arg("--output-dir")
        .arg(&out)
        .output()
        .expect("analyze should run");

    // No winter data: seasonal sizing fails, the rest still run.
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("6 analyses completed, 1 failed"), "{stdout}");
    assert!(out.join("battery_sizing.txt").exists());
    assert!(!out.join("seasonal_storage.txt").exists());
}

#[test]
fn missing_input_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = bin()
        .args(["analyze", "--input"])
        .arg(dir.path().join("absent.csv"))
        .output()
        .expect("analyze should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("source file not found"), "{stderr}");
}

#[test]
fn unknown_preset_is_rejected() {
    let output = bin()
        .args(["analyze", "--input", "x.csv", "--preset", "turbo"])
        .output()
        .expect("analyze should run");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "{stderr}");
}
