// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use labwired_probe_config::{load_probe_script, parse_override, ProbeScript};
use labwired_probe_core::waveform::reference_trace;
use labwired_probe_core::{Checker, FailureKinds, ReportOptions, RunMetrics, RunStats, Verdict};

mod golden;
mod tee_writer;
mod vcd_trace;

use golden::GoldenMismatch;
use tee_writer::TeeWriter;
use vcd_trace::{write_vcd, VcdSource};

const EXIT_PASS: u8 = 0;
const EXIT_CHECK_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "LabWired bus probe: I2C/SPI master conformance checking",
    long_about = None
)]
struct Cli {
    /// Enable debug logging of sampler and decoder activity
    #[arg(long, global = true)]
    trace_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a recorded VCD trace against a probe script.
    Check(CheckArgs),

    /// Write the VCD a conforming master would produce for a probe script.
    Synth(SynthArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the probe script (YAML)
    #[arg(short = 'c', long)]
    script: PathBuf,

    /// Path to the recorded VCD trace
    #[arg(short = 't', long)]
    trace: PathBuf,

    /// Golden report to compare the emitted report against
    #[arg(short = 'e', long)]
    expect: Option<PathBuf>,

    /// Treat every golden line as a regular expression
    #[arg(long, requires = "expect")]
    regex: bool,

    /// Prefix report lines with the event time in nanoseconds
    #[arg(long)]
    timestamps: bool,

    /// Build-time parameter override, e.g. SPI_MODE=3 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Directory for result.json and report.log
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write a JUnit XML report to this path
    #[arg(long)]
    junit: Option<PathBuf>,

    /// Do not echo the report to stdout (still captured for artifacts)
    #[arg(long)]
    quiet: bool,
}

#[derive(Parser, Debug)]
struct SynthArgs {
    /// Path to the probe script (YAML)
    #[arg(short = 'c', long)]
    script: PathBuf,

    /// Output VCD path
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Build-time parameter override, e.g. SPI_MODE=3 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Clock the master at this speed instead of the configured one
    #[arg(long)]
    speed_hz: Option<u64>,
}

#[derive(Debug, Serialize)]
struct RunResult {
    result_schema_version: String,
    status: String,
    message: Option<String>,
    failures: Vec<String>,
    verdict: Verdict,
    golden: Option<GoldenResult>,
    stats: Option<RunStats>,
    trace_hash: String,
    config: RunConfig,
}

#[derive(Debug, Serialize)]
struct GoldenResult {
    path: PathBuf,
    regex: bool,
    mismatches: Vec<GoldenMismatch>,
}

#[derive(Debug, Serialize)]
struct RunConfig {
    script: PathBuf,
    trace: PathBuf,
    protocol: Option<String>,
    overrides: Vec<(String, String)>,
    full_load: bool,
    timestamps: bool,
}

impl RunConfig {
    fn new(args: &CheckArgs, script: Option<&ProbeScript>, overrides: &[(String, String)]) -> Self {
        Self {
            script: args.script.clone(),
            trace: args.trace.clone(),
            protocol: script
                .and_then(|s| s.protocol().ok())
                .map(|p| p.name().to_string()),
            overrides: overrides.to_vec(),
            full_load: script.map(|s| s.full_load).unwrap_or(false),
            timestamps: args.timestamps,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The report owns stdout; logs go to stderr.
    if cli.trace_log {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Synth(args) => run_synth(args),
    }
}

fn parse_overrides(raw: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    raw.iter()
        .map(|s| parse_override(s).map_err(anyhow::Error::from))
        .collect()
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn run_check(args: CheckArgs) -> ExitCode {
    let start = Instant::now();

    let overrides = match parse_overrides(&args.overrides) {
        Ok(o) => o,
        Err(e) => return config_error(&args, None, &[], format!("{:#}", e)),
    };
    let script = match load_probe_script(&args.script, &overrides) {
        Ok(s) => s,
        Err(e) => return config_error(&args, None, &overrides, format!("{:#}", e)),
    };

    let golden_text = match &args.expect {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => Some(text),
            Err(e) => {
                let message = format!("Failed to read golden report {:?}: {}", path, e);
                return config_error(&args, Some(&script), &overrides, message);
            }
        },
        None => None,
    };

    let trace_bytes = match std::fs::read(&args.trace) {
        Ok(b) => b,
        Err(e) => {
            let message = format!("Failed to read trace {:?}: {}", args.trace, e);
            return runtime_error(&args, &script, &overrides, String::new(), message);
        }
    };
    let trace_hash = sha256_hex(&trace_bytes);

    let echo: Box<dyn Write> = if args.quiet {
        Box::new(std::io::sink())
    } else {
        Box::new(std::io::stdout())
    };
    let options = ReportOptions::with_timestamps(args.timestamps);
    let mut checker = match Checker::new(&script, options, TeeWriter::new(echo)) {
        Ok(c) => c,
        Err(e) => return config_error(&args, Some(&script), &overrides, e.to_string()),
    };
    let metrics = Arc::new(RunMetrics::new());
    checker.add_observer(metrics.clone());

    let pins: Vec<&str> = script.pin_roles().into_iter().map(|(pin, _)| pin).collect();
    let mut source = match VcdSource::new(Cursor::new(trace_bytes), &pins) {
        Ok(s) => s,
        Err(e) => {
            let message = format!("Failed to open trace {:?}: {}", args.trace, e);
            return runtime_error(&args, &script, &overrides, trace_hash, message);
        }
    };

    info!("Checking {:?} against {:?}", args.trace, args.script);
    let (verdict, sink) = match checker.run(&mut source) {
        Ok(r) => r,
        Err(e) => {
            let message = format!("Check aborted: {}", e);
            return runtime_error(&args, &script, &overrides, trace_hash, message);
        }
    };
    debug!("Report: {} bytes", sink.bytes_written());
    let report = String::from_utf8_lossy(sink.captured()).into_owned();

    let golden = match (&args.expect, golden_text) {
        (Some(path), Some(text)) => match golden::compare(&text, &report, args.regex) {
            Ok(mismatches) => Some(GoldenResult {
                path: path.clone(),
                regex: args.regex,
                mismatches,
            }),
            Err(e) => {
                return config_error(&args, Some(&script), &overrides, format!("{:#}", e));
            }
        },
        _ => None,
    };

    let mut failures = verdict.failure_names();
    let mut message = verdict.fatal.clone();
    if let Some(g) = golden.as_ref().filter(|g| !g.mismatches.is_empty()) {
        failures.push("golden".to_string());
        for m in &g.mismatches {
            warn!(
                "Golden line {}: expected {:?}, got {:?}",
                m.line, m.expected, m.actual
            );
        }
        message.get_or_insert_with(|| {
            format!("report differs from golden file on {} line(s)", g.mismatches.len())
        });
    }
    let status = if failures.is_empty() { "pass" } else { "fail" };
    info!("Result: {}", status);

    let result = RunResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        message,
        failures,
        verdict,
        golden,
        stats: Some(metrics.snapshot()),
        trace_hash,
        config: RunConfig::new(&args, Some(&script), &overrides),
    };
    write_outputs(&args, &result, Some(&report), start.elapsed());

    ExitCode::from(if status == "pass" {
        EXIT_PASS
    } else {
        EXIT_CHECK_FAIL
    })
}

fn config_error(
    args: &CheckArgs,
    script: Option<&ProbeScript>,
    overrides: &[(String, String)],
    message: String,
) -> ExitCode {
    error!("Configuration error: {}", message);
    let mut verdict = Verdict::new(script.map(ProbeScript::expected_entries).unwrap_or(0));
    verdict.failures.insert(FailureKinds::CONFIG);
    verdict.fatal = Some(message.clone());
    let result = RunResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: "error".to_string(),
        message: Some(message),
        failures: verdict.failure_names(),
        verdict,
        golden: None,
        stats: None,
        trace_hash: String::new(),
        config: RunConfig::new(args, script, overrides),
    };
    write_outputs(args, &result, None, Duration::from_secs(0));
    ExitCode::from(EXIT_CONFIG_ERROR)
}

fn runtime_error(
    args: &CheckArgs,
    script: &ProbeScript,
    overrides: &[(String, String)],
    trace_hash: String,
    message: String,
) -> ExitCode {
    error!("{}", message);
    let result = RunResult {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: "error".to_string(),
        message: Some(message),
        failures: Vec::new(),
        verdict: Verdict::new(script.expected_entries()),
        golden: None,
        stats: None,
        trace_hash,
        config: RunConfig::new(args, Some(script), overrides),
    };
    write_outputs(args, &result, None, Duration::from_secs(0));
    ExitCode::from(EXIT_RUNTIME_ERROR)
}

/// Best-effort artifact writing: failures are logged, never change the exit code.
fn write_outputs(args: &CheckArgs, result: &RunResult, report: Option<&str>, duration: Duration) {
    if let Some(output_dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            error!("Failed to create output directory {:?}: {}", output_dir, e);
        } else {
            let result_path = output_dir.join("result.json");
            match std::fs::File::create(&result_path) {
                Ok(f) => {
                    if let Err(e) = serde_json::to_writer_pretty(f, result) {
                        error!("Failed to write result.json: {}", e);
                    }
                }
                Err(e) => error!("Failed to create result.json: {}", e),
            }

            let report_path = output_dir.join("report.log");
            if let Err(e) = std::fs::write(&report_path, report.unwrap_or_default()) {
                error!("Failed to write report.log: {}", e);
            }
        }
    }

    if let Some(junit_path) = &args.junit {
        if let Some(parent) = junit_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = write_junit_xml(junit_path, result, duration) {
            error!("Failed to write JUnit report {:?}: {}", junit_path, e);
        }
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn write_junit_xml(path: &Path, result: &RunResult, duration: Duration) -> std::io::Result<()> {
    let verdict = &result.verdict;
    let mut details = String::new();
    details.push_str(&format!(
        "result_schema_version={}\n",
        result.result_schema_version
    ));
    if let Some(msg) = &result.message {
        details.push_str(&format!("message={}\n", msg));
    }
    details.push_str(&format!("verdict={}\n", verdict));
    details.push_str(&format!(
        "entries={}/{}\n",
        verdict.observed_entries, verdict.expected_entries
    ));
    details.push_str(&format!("mismatches={}\n", verdict.mismatches));
    details.push_str(&format!("timing_violations={}\n", verdict.timing_violations));
    details.push_str(&format!("trace_hash={}\n", result.trace_hash));
    details.push_str(&format!("script={}\n", result.config.script.display()));
    details.push_str(&format!("trace={}\n", result.config.trace.display()));

    let time_secs = duration.as_secs_f64();
    let mut tests: u64 = 0;
    let mut failures: u64 = 0;
    let mut errors: u64 = 0;
    let mut testcases = String::new();

    tests += 1;
    testcases.push_str(&format!(
        "  <testcase classname=\"labwired-probe\" name=\"verdict\" time=\"{:.6}\">\n",
        time_secs
    ));
    if result.status == "error" {
        let err_type = if verdict.failures.contains(FailureKinds::CONFIG) {
            "config error"
        } else {
            "runtime error"
        };
        errors += 1;
        testcases.push_str(&format!(
            "    <error message=\"{}\">{}</error>\n",
            xml_escape(err_type),
            xml_escape(&details)
        ));
    } else if !verdict.passed() {
        failures += 1;
        testcases.push_str(&format!(
            "    <failure message=\"{}\">{}</failure>\n",
            xml_escape(&verdict.to_string()),
            xml_escape(&details)
        ));
    }
    testcases.push_str("  </testcase>\n");

    if let Some(golden) = &result.golden {
        tests += 1;
        testcases.push_str(&format!(
            "  <testcase classname=\"labwired-probe\" name=\"{}\" time=\"0.000000\">\n",
            xml_escape(&format!("golden: {}", golden.path.display()))
        ));
        if !golden.mismatches.is_empty() {
            failures += 1;
            let mut body = String::new();
            for m in &golden.mismatches {
                body.push_str(&format!(
                    "line {}: expected {:?} got {:?}\n",
                    m.line, m.expected, m.actual
                ));
            }
            testcases.push_str(&format!(
                "    <failure message=\"report differs from golden file\">{}</failure>\n",
                xml_escape(&body)
            ));
        }
        testcases.push_str("  </testcase>\n");
    }

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<testsuite name="labwired-probe" tests="{}" failures="{}" errors="{}" time="{:.6}">"#,
        tests, failures, errors, time_secs
    ));
    xml.push('\n');
    xml.push_str("  <properties>\n");
    xml.push_str(&format!(
        "    <property name=\"result_schema_version\" value=\"{}\"/>\n",
        xml_escape(&result.result_schema_version)
    ));
    if let Some(protocol) = &result.config.protocol {
        xml.push_str(&format!(
            "    <property name=\"protocol\" value=\"{}\"/>\n",
            xml_escape(protocol)
        ));
    }
    xml.push_str(&format!(
        "    <property name=\"trace_hash\" value=\"{}\"/>\n",
        xml_escape(&result.trace_hash)
    ));
    xml.push_str("  </properties>\n");
    xml.push_str(&testcases);
    xml.push_str("</testsuite>\n");

    std::fs::write(path, xml)
}

fn run_synth(args: SynthArgs) -> ExitCode {
    let script = match parse_overrides(&args.overrides)
        .and_then(|overrides| load_probe_script(&args.script, &overrides))
    {
        Ok(s) => s,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    let events = match reference_trace(&script, args.speed_hz) {
        Ok(events) => events,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let written = std::fs::File::create(&args.output)
        .map_err(anyhow::Error::from)
        .and_then(|f| {
            let mut out = BufWriter::new(f);
            write_vcd(&mut out, &events)?;
            out.flush()?;
            Ok(())
        });
    match written {
        Ok(()) => {
            info!(
                "Wrote {} pin events to {:?}",
                events.len(),
                args.output
            );
            ExitCode::from(EXIT_PASS)
        }
        Err(e) => {
            error!("Failed to write {:?}: {:#}", args.output, e);
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}
