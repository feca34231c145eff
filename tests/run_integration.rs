#![cfg(unix)]

mod common;

use common::{json_of, stdout_of, writes_artifact, CourseTree};
use std::time::{Duration, Instant};

#[test]
fn valid_chart_passes_and_writes_pdf() {
    let tree = CourseTree::create();
    tree.add_chart("L01_Foo", "01_bar", &writes_artifact("bar", 2000));

    let output = tree.chartcheck(&["run"]);
    assert!(output.status.success(), "{}", stdout_of(&output));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("ok   L01_Foo/01_bar"));
    assert!(stdout.contains("passed: 1 valid, 0 invalid"));

    let pdf = tree.root().join("L01_Foo/01_bar/bar.pdf");
    assert_eq!(std::fs::metadata(pdf).expect("pdf written").len(), 2000);
}

#[test]
fn missing_artifact_fails_the_run() {
    let tree = CourseTree::create();
    tree.add_chart("L01_Foo", "01_bar", "exit 0\n");

    let output = tree.chartcheck(&["run", "--json"]);
    assert!(!output.status.success());
    let report = json_of(&output);
    let verdict = &report["results"][0]["verdict"];
    assert_eq!(verdict["status"], "invalid");
    assert_eq!(verdict["reason"], "artifact_missing");
    assert_eq!(report["results"][0]["artifact_exists"], false);
}

#[test]
fn undersized_artifact_is_named_in_human_output() {
    let tree = CourseTree::create();
    tree.add_chart("L01_Foo", "01_bar", &writes_artifact("bar", 10));

    let output = tree.chartcheck(&["run"]);
    assert!(!output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("- L01_Foo/01_bar: artifact below size threshold"));
    assert!(stdout.contains("directory: L01_Foo/01_bar"));
    assert!(stdout.contains("script: L01_Foo/01_bar/bar.sh"));
    assert!(stdout.contains("artifact: 10 bytes (must exceed 1024)"));
}

#[test]
fn hung_script_times_out_and_sweep_continues() {
    let tree = CourseTree::create();
    tree.add_chart("L01_Foo", "01_bar", "while :; do :; done\n");
    tree.add_chart("L01_Foo", "02_baz", &writes_artifact("baz", 2000));

    let start = Instant::now();
    let output = tree.chartcheck(&["run", "--timeout", "1", "--json"]);
    assert!(start.elapsed() < Duration::from_secs(30));
    assert!(!output.status.success());

    let report = json_of(&output);
    let results = report["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["unit_id"], "L01_Foo/01_bar");
    assert_eq!(results[0]["timed_out"], true);
    assert_eq!(results[0]["verdict"]["reason"], "timeout");
    assert_eq!(results[1]["verdict"]["status"], "valid");
}

#[test]
fn failing_script_stderr_is_surfaced() {
    let tree = CourseTree::create();
    tree.add_chart(
        "L01_Foo",
        "01_bar",
        "echo 'ModuleNotFoundError: matplotlib' >&2\nexit 1\n",
    );

    let output = tree.chartcheck(&["run"]);
    assert!(!output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("script exited with status 1"));
    assert!(stdout.contains("ModuleNotFoundError: matplotlib"));
}

#[test]
fn filter_runs_a_single_unit() {
    let tree = CourseTree::create();
    tree.add_chart("L01_Foo", "01_bar", &writes_artifact("bar", 2000));
    tree.add_chart("L02_Qux", "01_broken", "exit 1\n");

    let output = tree.chartcheck(&["run", "--filter", "L01_Foo", "--json"]);
    assert!(output.status.success());
    let report = json_of(&output);
    assert_eq!(report["discovered_count"], 2);
    assert_eq!(report["selected_count"], 1);
    assert_eq!(report["filter"], "L01_Foo");
    assert!(!tree.root().join("L02_Qux/01_broken/broken.pdf").exists());
}

#[test]
fn report_file_is_written_alongside_output() {
    let tree = CourseTree::create();
    tree.add_chart("L01_Foo", "01_bar", &writes_artifact("bar", 2000));
    let report_path = tree.root().join("out/reports/charts.json");
    let report_arg = report_path.display().to_string();

    let output = tree.chartcheck(&["run", "--report", &report_arg]);
    assert!(output.status.success());
    let content = std::fs::read_to_string(&report_path).expect("read report file");
    let report: serde_json::Value = serde_json::from_str(&content).expect("parse report");
    assert_eq!(report["valid_count"], 1);
    assert_eq!(report["schema_version"], 1);
    let digest = report["results"][0]["artifact_sha256"]
        .as_str()
        .expect("artifact digest");
    assert_eq!(digest.len(), 64);
}

#[test]
fn floor_violation_fails_unfiltered_run() {
    let tree = CourseTree::create();
    tree.add_chart("L01_Foo", "01_bar", &writes_artifact("bar", 2000));

    let output = tree.chartcheck(&["run", "--min-units", "40"]);
    assert!(!output.status.success());
    assert!(stdout_of(&output).contains("expected at least 40 chart scripts, found 1"));

    let filtered = tree.chartcheck(&["run", "--min-units", "40", "--filter", "01_bar"]);
    assert!(filtered.status.success());
}

#[test]
fn missing_root_is_a_hard_error() {
    let tree = CourseTree::create();
    let missing = tree.root().join("nope");
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_chartcheck"))
        .args(["run", "--root"])
        .arg(&missing)
        .output()
        .expect("run chartcheck");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("resolve chart root"));
}
