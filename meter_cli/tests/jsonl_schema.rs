//! Checks the shape of --json output: one JSON object per line on stdout,
//! logs kept off stdout.

use assert_cmd::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[device]
name = "TEST METER"
device_eui = "0004a30b001c0530"
app_eui = "70b3d57ed0000000"

[calibration.current]
scale = 51.61
supply_mv = 3283

[calibration.voltage]
scale = 897.6
supply_mv = 5056

[sampling]
window = 500

[uplink]
interval_ms = 50

[join]
max_attempts = 10
pump_timeout_ms = 1

[runner]
pump_timeout_ms = 1
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn stdout_json_lines(cmd: &mut Command) -> Vec<serde_json::Value> {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("stdout line is valid JSON"))
        .collect()
}

#[test]
fn measure_json_has_all_metric_fields() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let mut cmd = Command::cargo_bin("meter_cli").unwrap();
    cmd.arg("--config").arg(&cfg).arg("--json").arg("measure");
    let lines = stdout_json_lines(&mut cmd);
    assert_eq!(lines.len(), 1);

    let v = &lines[0];
    assert_eq!(v["event"], "measurement");
    for key in [
        "current_rms",
        "voltage_rms",
        "active_power",
        "apparent_power",
        "reactive_power",
        "power_factor",
    ] {
        assert!(v[key].is_f64(), "missing or non-numeric field {key}");
    }
    let pf = v["power_factor"].as_f64().unwrap();
    assert!((-1.01..=1.01).contains(&pf));
}

#[test]
fn run_json_reports_cycle_count() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir);

    let mut cmd = Command::cargo_bin("meter_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--json")
        .args(["run", "--cycles", "2"]);
    let lines = stdout_json_lines(&mut cmd);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["event"], "run_complete");
    assert_eq!(lines[0]["cycles"], 2);
}

#[test]
fn json_error_object_on_bad_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "this is not toml [").unwrap();

    let mut cmd = Command::cargo_bin("meter_cli").unwrap();
    cmd.arg("--config").arg(&path).arg("--json").arg("measure");
    let out = cmd.assert().failure().get_output().stdout.clone();
    let line = String::from_utf8(out).unwrap();
    let v: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(v["event"], "error");
    assert!(v["message"].is_string());
}
