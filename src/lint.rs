//! Static conventions every chart script is expected to follow.
//!
//! These checks read script sources only; nothing is executed.
use crate::config::LintConfig;
use crate::schema::ChartScript;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;

/// Marker a script uses to save next to itself.
const SELF_RELATIVE_MARKER: &str = "Path(__file__).parent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintCheck {
    Docstring,
    Palette,
    SaveLocation,
}

impl fmt::Display for LintCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LintCheck::Docstring => "docstring",
            LintCheck::Palette => "palette",
            LintCheck::SaveLocation => "save_location",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintFinding {
    pub unit_id: String,
    pub check: LintCheck,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintReport {
    pub checked_count: usize,
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Lint the first `config.sample` units (all of them when `sample` is 0).
pub fn lint(units: &[ChartScript], config: &LintConfig) -> Result<LintReport> {
    let take = if config.sample == 0 {
        units.len()
    } else {
        config.sample.min(units.len())
    };
    let mut report = LintReport::default();
    for unit in &units[..take] {
        let source = fs::read_to_string(&unit.script_path)
            .with_context(|| format!("read chart script {}", unit.script_path.display()))?;
        report
            .findings
            .extend(lint_source(unit, &source, &config.palette));
        report.checked_count += 1;
    }
    tracing::info!(
        checked = report.checked_count,
        findings = report.findings.len(),
        "lint complete"
    );
    Ok(report)
}

fn lint_source(unit: &ChartScript, source: &str, palette: &[String]) -> Vec<LintFinding> {
    let mut findings = Vec::new();
    let mut flag = |check: LintCheck, message: String| {
        findings.push(LintFinding {
            unit_id: unit.id.clone(),
            check,
            message,
        })
    };

    if !source.contains("\"\"\"") && !source.contains("'''") {
        flag(LintCheck::Docstring, "no docstring".to_string());
    }

    if !palette.is_empty() && !palette.iter().any(|name| source.contains(name.as_str())) {
        flag(
            LintCheck::Palette,
            format!("uses none of the palette colors {}", palette.join(", ")),
        );
    }

    if !source.contains(SELF_RELATIVE_MARKER) {
        flag(
            LintCheck::SaveLocation,
            format!("does not save relative to {SELF_RELATIVE_MARKER}"),
        );
    }
    let artifact = &unit.expected_artifact_name;
    let double_quoted = format!("\"{artifact}\"");
    let single_quoted = format!("'{artifact}'");
    if !source.contains(&double_quoted) && !source.contains(&single_quoted) {
        flag(LintCheck::SaveLocation, format!("should save to {artifact}"));
    }

    findings
}
