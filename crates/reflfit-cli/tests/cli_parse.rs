use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crate should live under crates/")
        .parent()
        .expect("crates/ should live under the workspace root")
        .to_path_buf()
}

fn fixture_path(name: &str) -> PathBuf {
    workspace_root()
        .join("crates/reflfit-core/tests/fixtures")
        .join(name)
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reflfit"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("reflfit binary should run")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("test paths should be UTF-8")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content)
        .unwrap_or_else(|error| panic!("{} should be writable: {}", path.display(), error));
}

#[test]
fn parse_prints_the_report_as_json() {
    let log = fixture_path("legacy_slab.log");
    let output = run_cli(&["parse", path_arg(&log)]);

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be a JSON report");
    assert_eq!(report["format"], "slab_dump");
    assert_eq!(report["chi2"], 2.614);
    assert_eq!(report["incomplete"], false);
    assert_eq!(report["outcome"]["kind"], "single");
    assert_eq!(report["outcome"]["layers"][0]["name"], "SiOx");
    assert_eq!(report["outcome"]["layers"][0]["layer_number"], 1);
    assert_eq!(report["outcome"]["layers"][0]["thickness"]["error"], 0.4);
    assert!(
        report["outcome"]["layers"][0]["thickness"].get("display").is_none(),
        "display strings are opt-in"
    );
}

#[test]
fn pretty_summary_is_written_to_the_output_file() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output_path = temp.path().join("reports/summary.txt");
    let log = fixture_path("simultaneous_slab.log");

    let output = run_cli(&[
        "parse",
        path_arg(&log),
        "--summary",
        "--pretty",
        "--output",
        path_arg(&output_path),
    ]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty(), "report should go to the file only");

    let summary = fs::read_to_string(&output_path).expect("summary file should exist");
    assert!(summary.starts_with("format: slab_dump"));
    assert!(summary.contains("chi2: 2.03"));
    assert!(summary.contains("dataset 'h2o' chi2: 2.44"));
    assert!(summary.ends_with('\n'));
}

#[test]
fn incomplete_fit_exits_with_one() {
    let temp = TempDir::new().expect("tempdir should be created");
    let log = fs::read_to_string(fixture_path("legacy_slab.log")).expect("fixture should read");
    let truncated = temp.path().join("no_chi2.log");
    write_file(&truncated, &log.replace("[chisq=2.614(12), nllf=311.07]\n", ""));

    let output = run_cli(&["parse", path_arg(&truncated)]);
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report is still printed");
    assert_eq!(report["incomplete"], true);
    assert_eq!(report["chi2"], Value::Null);
}

#[test]
fn missing_arguments_exit_with_two() {
    let output = run_cli(&["parse"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: [INPUT.CLI_USAGE]"));

    let log = fixture_path("legacy_slab.log");
    let output = run_cli(&[
        "parse",
        path_arg(&log),
        "--expected-layers",
        "2",
        "--layer",
        "SiOx",
    ]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unrecognized_log_exits_with_three() {
    let temp = TempDir::new().expect("tempdir should be created");
    let log = temp.path().join("killed.log");
    write_file(&log, "Loading model\nstep 10 cost 3.2\nKilled\n");

    let output = run_cli(&["parse", path_arg(&log)]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [LOG.NO_MODEL]"), "stderr: {stderr}");
    assert!(output.stdout.is_empty());

    let output = run_cli(&["detect", path_arg(&log)]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn shape_mismatch_exits_with_four() {
    let log = fixture_path("legacy_slab.log");
    let output = run_cli(&[
        "parse",
        path_arg(&log),
        "--layer",
        "PS",
        "--front",
        "air",
        "--back",
        "Si",
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: [MODEL.LAYER_NAMES]"));
}

#[test]
fn unreadable_log_is_an_internal_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let missing = temp.path().join("absent.log");
    let output = run_cli(&["parse", path_arg(&missing)]);
    assert_eq!(output.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: [IO.CLI] failed to read fit log"));
}

#[test]
fn detect_and_blocks_describe_the_log() {
    let json_log = fixture_path("json_model.log");
    let output = run_cli(&["detect", path_arg(&json_log)]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "json");

    let simultaneous = fixture_path("simultaneous_slab.log");
    let output = run_cli(&["blocks", path_arg(&simultaneous), "--kind", "refl"]);
    assert_eq!(output.status.code(), Some(0));
    let blocks: Value = serde_json::from_slice(&output.stdout).expect("blocks should be JSON");
    let labels = blocks
        .as_array()
        .expect("blocks should be an array")
        .iter()
        .map(|block| block["dataset_label"].as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, [Some("d2o"), Some("h2o"), Some("cmsi")]);
}

#[test]
fn config_file_tightens_reconciliation() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config = temp.path().join("ingest.json");
    write_file(&config, r#"{"layerRelativeTolerance": 0}"#);
    let log = fixture_path("legacy_slab.log");

    let output = run_cli(&["parse", path_arg(&log), "--config", path_arg(&config)]);
    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report should be JSON");
    assert_eq!(report["outcome"]["layers"][0]["thickness"]["error"], 0.0);
}
