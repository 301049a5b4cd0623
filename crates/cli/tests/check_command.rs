// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const I2C_SCRIPT: &str = r#"
schema_version: "1.0"
name: eeprom-read
i2c:
  scl: "top.scl"
  sda: "top.sda"
  speed_khz: 400
expect:
  bytes: [0x99, 0x3A]
  acks: [true, true]
"#;

const SPI_SCRIPT: &str = r#"
schema_version: "1.0"
spi:
  sclk: "top.spi.sclk"
  mosi: "top.spi.mosi"
  miso: "top.spi.miso"
  chip_selects: ["top.spi.cs0"]
  mode: 0
  clock_divider: 8
expect:
  mosi: [0x12, 0x34]
  miso: [0xAA, 0xBB]
"#;

fn temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("labwired-probe-tests");
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    dir.push(format!("{}-{}", prefix, nonce));
    std::fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

fn probe() -> Command {
    Command::new(env!("CARGO_BIN_EXE_labwired-probe"))
}

fn synth(script: &Path, out: &Path, extra: &[&str]) {
    let output = probe()
        .args(["synth", "--script", script.to_str().unwrap()])
        .args(["--output", out.to_str().unwrap()])
        .args(extra)
        .output()
        .expect("Failed to execute synth");
    assert!(
        output.status.success(),
        "synth failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn check(script: &Path, trace: &Path, extra: &[&str]) -> Output {
    probe()
        .args(["check", "--script", script.to_str().unwrap()])
        .args(["--trace", trace.to_str().unwrap()])
        .args(extra)
        .output()
        .expect("Failed to execute check")
}

fn read_result(dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.join("result.json")).expect("result.json missing");
    serde_json::from_str(&content).expect("result.json is not JSON")
}

#[test]
fn test_i2c_reference_trace_passes() {
    let dir = temp_dir("i2c-pass");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let trace = dir.join("bus.vcd");
    synth(&script, &trace, &[]);

    let artifacts = dir.join("artifacts");
    let output = check(
        &script,
        &trace,
        &["--output-dir", artifacts.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout,
        "I2C start\n\
         I2C address 0x99 (0x4c read)\n\
         I2C ack\n\
         I2C data 0x3a (read)\n\
         I2C ack\n\
         I2C stop\n\
         VERDICT: PASS\n"
    );
    let report_log = std::fs::read_to_string(artifacts.join("report.log")).unwrap();
    assert_eq!(report_log, stdout);

    let result = read_result(&artifacts);
    assert_eq!(result["result_schema_version"], "1.0");
    assert_eq!(result["status"], "pass");
    assert_eq!(result["failures"], serde_json::json!([]));
    assert_eq!(result["verdict"]["observed_entries"], 2);
    assert_eq!(result["config"]["protocol"], "i2c");
    assert_eq!(result["trace_hash"].as_str().unwrap().len(), 64);
    assert!(result["stats"]["transitions"].as_u64().unwrap() > 0);
    assert!(result["stats"]["transitions_by_pin"]["top.scl"].as_u64().unwrap() > 0);
}

#[test]
fn test_content_mismatch_exits_one() {
    let dir = temp_dir("i2c-mismatch");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let trace = dir.join("bus.vcd");
    synth(&script, &trace, &[]);

    let other = write_file(
        &dir,
        "other.yaml",
        &I2C_SCRIPT.replace("[0x99, 0x3A]", "[0x99, 0x3B]"),
    );
    let artifacts = dir.join("artifacts");
    let output = check(
        &other,
        &trace,
        &["--output-dir", artifacts.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MISMATCH: entry 1 byte expected 0x3b got 0x3a\n"));
    assert!(stdout.ends_with("VERDICT: FAIL (mismatch)\n"));

    let result = read_result(&artifacts);
    assert_eq!(result["status"], "fail");
    assert_eq!(result["failures"], serde_json::json!(["mismatch"]));
    assert_eq!(result["verdict"]["mismatches"], 1);
}

#[test]
fn test_overspeed_master_fails_timing() {
    let dir = temp_dir("i2c-fast");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let trace = dir.join("fast.vcd");
    synth(&script, &trace, &["--speed-hz", "1000000"]);

    let output = check(&script, &trace, &[]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TIMING: i2c clock 1000000 Hz above limit 440000 Hz"));
    assert!(stdout.ends_with("VERDICT: FAIL (timing)\n"));
}

#[test]
fn test_spi_mode_override_on_both_sides() {
    let dir = temp_dir("spi-mode3");
    let script = write_file(&dir, "probe.yaml", SPI_SCRIPT);
    let trace = dir.join("bus.vcd");
    synth(&script, &trace, &["--set", "SPI_MODE=3"]);

    let output = check(&script, &trace, &["--set", "SPI_MODE=3"]);
    assert_eq!(
        output.status.code(),
        Some(0),
        "{}",
        String::from_utf8_lossy(&output.stdout)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SPI word mosi=0x12 miso=0xaa\n"));
    assert!(stdout.contains("SPI word mosi=0x34 miso=0xbb\n"));

    // A mode 3 master against a mode 0 probe starts with sclk high.
    let output = check(&script, &trace, &[]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PROTOCOL ERROR: sclk not at idle polarity for mode 0"));
}

#[test]
fn test_timestamps_prefix_report_lines() {
    let dir = temp_dir("timestamps");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let trace = dir.join("bus.vcd");
    synth(&script, &trace, &[]);

    let output = check(&script, &trace, &["--timestamps"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with('@'));
    assert!(lines[0].ends_with(" I2C start"));
    assert_eq!(lines.last(), Some(&"VERDICT: PASS"));
}

#[test]
fn test_quiet_still_writes_report_log() {
    let dir = temp_dir("quiet");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let trace = dir.join("bus.vcd");
    synth(&script, &trace, &[]);

    let artifacts = dir.join("artifacts");
    let junit = dir.join("junit").join("probe.xml");
    let output = check(
        &script,
        &trace,
        &[
            "--quiet",
            "--output-dir",
            artifacts.to_str().unwrap(),
            "--junit",
            junit.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());

    let report_log = std::fs::read_to_string(artifacts.join("report.log")).unwrap();
    assert!(report_log.ends_with("VERDICT: PASS\n"));

    let xml = std::fs::read_to_string(&junit).unwrap();
    assert!(xml.contains("<testsuite name=\"labwired-probe\" tests=\"1\" failures=\"0\" errors=\"0\""));
    assert!(xml.contains("name=\"verdict\""));
    assert!(xml.contains("<property name=\"protocol\" value=\"i2c\"/>"));
}

#[test]
fn test_invalid_script_is_config_error() {
    let dir = temp_dir("config-error");
    let script = write_file(
        &dir,
        "probe.yaml",
        &SPI_SCRIPT.replace("mode: 0", "mode: 7"),
    );
    let trace = write_file(&dir, "empty.vcd", "$enddefinitions $end\n");
    let artifacts = dir.join("artifacts");
    let junit = artifacts.join("junit.xml");

    let output = check(
        &script,
        &trace,
        &[
            "--output-dir",
            artifacts.to_str().unwrap(),
            "--junit",
            junit.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    // Nothing is decoded before the script is accepted.
    assert!(output.stdout.is_empty());

    let result = read_result(&artifacts);
    assert_eq!(result["status"], "error");
    assert_eq!(result["failures"], serde_json::json!(["config"]));
    assert!(result["message"].as_str().unwrap().contains("spi mode 7"));

    let xml = std::fs::read_to_string(&junit).unwrap();
    assert!(xml.contains("errors=\"1\""));
    assert!(xml.contains("<error message=\"config error\">"));
}

#[test]
fn test_unknown_override_is_config_error() {
    let dir = temp_dir("bad-override");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let trace = dir.join("bus.vcd");
    synth(&script, &trace, &[]);

    let output = check(&script, &trace, &["--set", "BOGUS=1"]);
    assert_eq!(output.status.code(), Some(2));
    let output = check(&script, &trace, &["--set", "SPI_MODE=1"]);
    assert_eq!(output.status.code(), Some(2));
    let output = check(&script, &trace, &["--set", "no-equals-sign"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_trace_is_runtime_error() {
    let dir = temp_dir("missing-trace");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let artifacts = dir.join("artifacts");

    let output = check(
        &script,
        &dir.join("nope.vcd"),
        &["--output-dir", artifacts.to_str().unwrap()],
    );
    assert_eq!(output.status.code(), Some(3));
    let result = read_result(&artifacts);
    assert_eq!(result["status"], "error");
    assert_eq!(result["trace_hash"], "");
}

#[test]
fn test_unbound_pin_is_runtime_error() {
    let dir = temp_dir("unbound-pin");
    let script = write_file(&dir, "probe.yaml", I2C_SCRIPT);
    let trace = dir.join("bus.vcd");
    synth(&script, &trace, &[]);

    let renamed = write_file(
        &dir,
        "renamed.yaml",
        &I2C_SCRIPT.replace("top.sda", "top.data"),
    );
    let output = check(&renamed, &trace, &[]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("top.data"));
}

#[test]
fn test_synth_requires_expected_bytes() {
    let dir = temp_dir("synth-no-bytes");
    let script = write_file(
        &dir,
        "probe.yaml",
        &I2C_SCRIPT.replace("  bytes: [0x99, 0x3A]\n", ""),
    );
    let output = probe()
        .args(["synth", "--script", script.to_str().unwrap()])
        .args(["--output", dir.join("bus.vcd").to_str().unwrap()])
        .output()
        .expect("Failed to execute synth");
    assert_eq!(output.status.code(), Some(2));
    assert!(!dir.join("bus.vcd").exists());
}
