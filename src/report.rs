//! Human and JSON rendering for discovery, run, and lint reports.
//!
//! Human output names the directory, the script, and the violated clause for
//! every failure so a broken chart can be found without rerunning.
use crate::lint::LintReport;
use crate::schema::{DiscoveryReport, InvalidReason, RunReport, ValidationResult, Verdict};
use crate::util::relative_display;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serialize report")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("serialize report")
}

pub fn render_discovery(report: &DiscoveryReport) -> String {
    let root = report.root.as_path();
    let mut out = String::new();
    let _ = writeln!(out, "root: {}", root.display());
    for unit in &report.units {
        let _ = writeln!(
            out,
            "  {} -> {}",
            unit.id,
            relative_display(&unit.artifact_path(), root)
        );
    }
    render_issues(&mut out, report.issues.iter().map(|issue| issue.to_string()));
    render_floor(&mut out, report.units.len(), report.min_units, report.floor_ok);
    let _ = writeln!(
        out,
        "discovered: {} units, {} issues",
        report.units.len(),
        report.issues.len()
    );
    out
}

pub fn render_run(report: &RunReport) -> String {
    let root = report.root.as_path();
    let mut out = String::new();
    for result in &report.results {
        let label = if result.verdict.is_valid() { "ok  " } else { "FAIL" };
        let _ = writeln!(out, "{label} {} ({} ms)", result.unit_id, result.duration_ms);
    }

    let failures: Vec<&ValidationResult> = report
        .results
        .iter()
        .filter(|result| !result.verdict.is_valid())
        .collect();
    if !failures.is_empty() {
        let _ = writeln!(out, "\nfailures:");
        for result in failures {
            render_failure(&mut out, result, root);
        }
    }

    render_issues(&mut out, report.issues.iter().map(|issue| issue.to_string()));
    if report.filter.is_none() {
        render_floor(
            &mut out,
            report.discovered_count,
            report.min_units,
            report.floor_ok,
        );
    }
    let verdict = if report.passed() { "passed" } else { "failed" };
    let _ = writeln!(
        out,
        "\n{verdict}: {} valid, {} invalid, {} selected of {} discovered",
        report.valid_count, report.invalid_count, report.selected_count, report.discovered_count
    );
    out
}

fn render_failure(out: &mut String, result: &ValidationResult, root: &Path) {
    let Verdict::Invalid(reason) = &result.verdict else {
        return;
    };
    let _ = writeln!(out, "- {}: {reason}", result.unit_id);
    let _ = writeln!(
        out,
        "  directory: {}",
        relative_display(&result.directory_path, root)
    );
    let _ = writeln!(
        out,
        "  script: {}",
        relative_display(&result.script_path, root)
    );
    match reason {
        InvalidReason::ArtifactTooSmall {
            size_bytes,
            min_bytes,
        } => {
            let _ = writeln!(out, "  artifact: {size_bytes} bytes (must exceed {min_bytes})");
        }
        InvalidReason::Timeout { timeout_seconds } => {
            let _ = writeln!(out, "  killed after {timeout_seconds}s");
        }
        _ => {}
    }
    if matches!(reason, InvalidReason::ExitFailure { .. }) {
        if !result.stdout.trim().is_empty() {
            let _ = writeln!(out, "  stdout:\n{}", indent(result.stdout.trim_end()));
        }
        if !result.stderr.trim().is_empty() {
            let _ = writeln!(out, "  stderr:\n{}", indent(result.stderr.trim_end()));
        }
    }
}

pub fn render_lint(report: &LintReport) -> String {
    let mut out = String::new();
    for finding in &report.findings {
        let _ = writeln!(
            out,
            "{} [{}]: {}",
            finding.unit_id, finding.check, finding.message
        );
    }
    let verdict = if report.passed() { "passed" } else { "failed" };
    let _ = writeln!(
        out,
        "{verdict}: {} scripts checked, {} findings",
        report.checked_count,
        report.findings.len()
    );
    out
}

fn render_issues(out: &mut String, issues: impl Iterator<Item = String>) {
    let issues: Vec<String> = issues.collect();
    if issues.is_empty() {
        return;
    }
    let _ = writeln!(out, "\ndiscovery issues:");
    for issue in issues {
        let _ = writeln!(out, "  - {issue}");
    }
}

fn render_floor(out: &mut String, discovered: usize, min_units: usize, floor_ok: bool) {
    if !floor_ok {
        let _ = writeln!(
            out,
            "\nexpected at least {min_units} chart scripts, found {discovered}"
        );
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}
