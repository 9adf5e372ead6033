// Binary-level tests for the --json stdout contract and exit codes.
//
// stdout from --json commands must be exactly one JSON value with the
// documented shape; logs and summaries go to stderr.
//
// Run with: cargo test -p tabeval-cli --test json_contract_tests -- --nocapture

use std::path::Path;
use std::process::{Command, Output};

fn tabeval() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tabeval"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(args: &[&str]) -> Output {
    tabeval().args(args).output().expect("spawn tabeval")
}

fn path_str(p: &Path) -> &str {
    p.to_str().unwrap()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(stdout: &str) -> serde_json::Value {
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");

    serde_json::from_str(trimmed).unwrap_or_else(|e| {
        panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, trimmed)
    })
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A benchmark directory with pred/ and gold/ result files.
fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("pred")).unwrap();
    std::fs::create_dir(dir.path().join("gold")).unwrap();

    // q1: renamed columns, shuffled rows, float noise -> correct
    std::fs::write(
        dir.path().join("pred/q1.csv"),
        "Customer_ID,Total_Amt\n1,10.004\n2,20.5\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("gold/q1.csv"),
        "customer id,total amount\n2,20.5\n1,10.001\n",
    )
    .unwrap();

    // q2: half the rows wrong
    std::fs::write(dir.path().join("pred/q2.csv"), "id;name\n1;x\n2;y\n").unwrap();
    std::fs::write(dir.path().join("gold/q2.csv"), "id;name\n1;x\n3;z\n").unwrap();

    dir
}

fn write_config(dir: &Path, extra_instance: &str) -> std::path::PathBuf {
    let config = format!(
        r#"
name = "smoke"
tolerance = 0.01

[output]
json = "report.json"

[[instances]]
id = "q1"
predicted = "pred/q1.csv"
gold = ["gold/q1.csv"]

[[instances]]
id = "q2"
predicted = "pred/q2.csv"
gold = ["gold/q2.csv"]
{extra_instance}
"#
    );
    let path = dir.join("bench.toml");
    std::fs::write(&path, config).unwrap();
    path
}

// ===========================================================================
// tabeval compare --json
// ===========================================================================

#[test]
fn compare_json_correct_prediction() {
    let dir = fixture();
    let output = run(&[
        "compare",
        path_str(&dir.path().join("pred/q1.csv")),
        path_str(&dir.path().join("gold/q1.csv")),
        "--json",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&String::from_utf8_lossy(&output.stdout));

    assert_eq!(val["correct"], true);
    assert_eq!(val["gold_index"], 0);
    assert_eq!(val["candidates_scored"], 1);
    assert_eq!(val["columns"]["f1"], 1.0);
    assert_eq!(val["rows"]["f1"], 1.0);
    assert_eq!(val["rows"]["true_positive"], 2);
    assert_eq!(
        val["common_columns"],
        serde_json::json!(["customer id", "total amount"])
    );
}

#[test]
fn compare_incorrect_exits_one_with_json() {
    let dir = fixture();
    let output = run(&[
        "compare",
        path_str(&dir.path().join("pred/q2.csv")),
        path_str(&dir.path().join("gold/q2.csv")),
        "--json",
    ]);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let val = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(val["correct"], false);
    assert_eq!(val["rows"]["precision"], 0.5);
    assert_eq!(val["rows"]["recall"], 0.5);
    assert_eq!(val["columns"]["f1"], 1.0);
}

#[test]
fn compare_picks_best_gold() {
    let dir = fixture();
    let output = run(&[
        "compare",
        path_str(&dir.path().join("pred/q1.csv")),
        path_str(&dir.path().join("gold/q2.csv")),
        path_str(&dir.path().join("gold/q1.csv")),
        "--json",
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(val["gold_index"], 1);
    assert_eq!(val["candidates_scored"], 2);
}

#[test]
fn compare_rejects_bad_tolerance() {
    let dir = fixture();
    let output = run(&[
        "compare",
        path_str(&dir.path().join("pred/q1.csv")),
        path_str(&dir.path().join("gold/q1.csv")),
        "--tolerance",
        "0",
    ]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("tolerance"));
}

#[test]
fn compare_without_gold_is_usage_error() {
    let dir = fixture();
    let output = run(&["compare", path_str(&dir.path().join("pred/q1.csv"))]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn compare_missing_file_is_runtime_error() {
    let dir = fixture();
    let output = run(&[
        "compare",
        path_str(&dir.path().join("pred/nope.csv")),
        path_str(&dir.path().join("gold/q1.csv")),
    ]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("nope.csv"));
}

// ===========================================================================
// tabeval run --json
// ===========================================================================

#[test]
fn run_json_all_scored() {
    let dir = fixture();
    let config = write_config(dir.path(), "");
    let output = run(&["run", path_str(&config), "--json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&String::from_utf8_lossy(&output.stdout));

    assert_eq!(val["meta"]["config_name"], "smoke");
    assert_eq!(val["meta"]["case_sensitive"], false);
    assert!(val["meta"]["run_at"].is_string());

    let summary = &val["summary"];
    assert_eq!(summary["instances"], 2);
    assert_eq!(summary["scored"], 2);
    assert_eq!(summary["failed"], 0);
    assert_eq!(summary["correct"], 1);
    assert_eq!(summary["accuracy"], 0.5);
    assert_eq!(summary["rows"]["macro"]["f1"], 0.75);
    assert_eq!(summary["rows"]["counts"]["true_positive"], 3);

    let instances = val["instances"].as_array().unwrap();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0]["instance_id"], "q1");
    assert_eq!(instances[0]["correct"], true);
    assert_eq!(instances[1]["instance_id"], "q2");
    assert_eq!(instances[1]["correct"], false);
    assert!(val["failures"].as_array().unwrap().is_empty());

    // [output] json resolves next to the config
    let written = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    let on_disk: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(on_disk["summary"], val["summary"]);
}

#[test]
fn run_with_failed_instance_exits_five_and_reports_it() {
    let dir = fixture();
    let config = write_config(
        dir.path(),
        r#"
[[instances]]
id = "q3"
predicted = "pred/missing.csv"
gold = ["gold/q1.csv"]
"#,
    );
    let out_path = dir.path().join("elsewhere.json");
    let output = run(&[
        "run",
        path_str(&config),
        "--json",
        "--output",
        path_str(&out_path),
        "--threads",
        "2",
    ]);

    assert_eq!(output.status.code(), Some(5), "stderr: {}", stderr(&output));
    let val = assert_single_json(&String::from_utf8_lossy(&output.stdout));

    assert_eq!(val["summary"]["instances"], 3);
    assert_eq!(val["summary"]["failed"], 1);
    assert_eq!(val["summary"]["on_failure"], "count");
    let failure = &val["failures"][0];
    assert_eq!(failure["instance_id"], "q3");
    assert_eq!(failure["stage"], "load");
    assert!(failure["message"].as_str().unwrap().contains("missing.csv"));

    assert!(out_path.is_file());
    assert!(!dir.path().join("report.json").exists());
}

#[test]
fn run_invalid_config_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "name = \"x\"\ntolerance = 2.0\n").unwrap();

    let output = run(&["run", path_str(&config), "--json"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(output.stdout.is_empty(), "no JSON on config errors");
}

#[test]
fn run_missing_config_exits_four() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(&["run", path_str(&dir.path().join("absent.toml"))]);
    assert_eq!(output.status.code(), Some(4));
}

// ===========================================================================
// tabeval validate / normalize
// ===========================================================================

#[test]
fn validate_reports_missing_files() {
    let dir = fixture();
    let config = write_config(
        dir.path(),
        r#"
[[instances]]
id = "q3"
predicted = "pred/missing.csv"
gold = ["gold/q1.csv"]
"#,
    );
    let output = run(&["validate", path_str(&config)]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("missing.csv"));

    let ok = write_config(dir.path(), "");
    let output = run(&["validate", path_str(&ok)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn normalize_json() {
    let output = run(&["normalize", "Customer_ID", "avg_Qty", "The Total", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = assert_single_json(&String::from_utf8_lossy(&output.stdout));

    let normalized: Vec<&str> = val
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["normalized"].as_str().unwrap())
        .collect();
    assert_eq!(normalized, vec!["customer id", "average quantity", "total"]);
    assert_eq!(val[0]["raw"], "Customer_ID");
}

#[test]
fn normalize_plain_is_tab_separated() {
    let output = run(&["normalize", "Total_Amt"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Total_Amt\ttotal amount\n");
}
