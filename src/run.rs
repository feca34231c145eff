//! Sequential validation sweep over every discovered unit.
use crate::config::HarnessConfig;
use crate::discover::discover;
use crate::execute::{execute, ExecSettings};
use crate::schema::{floor_ok, RunReport, REPORT_SCHEMA_VERSION};
use crate::util::now_epoch_ms;
use anyhow::Result;
use std::path::Path;

/// Options that narrow or annotate a sweep.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Substring matched against unit ids (`L01_Intro/01_agent`).
    pub filter: Option<String>,
}

/// Discover, execute, and judge every selected unit under `root`.
///
/// The discovery floor is only enforced when no filter narrows the sweep.
pub fn run_sweep(root: &Path, config: &HarnessConfig, options: &RunOptions) -> Result<RunReport> {
    let settings = ExecSettings::from_config(config)?;
    let discovery = discover(root, config)?;
    let discovered_count = discovery.units.len();
    let floor_met = options.filter.is_some() || floor_ok(discovered_count, config.min_units);
    if !floor_met {
        tracing::warn!(
            discovered = discovered_count,
            min_units = config.min_units,
            "discovery found fewer units than required"
        );
    }

    let selected: Vec<_> = discovery
        .units
        .iter()
        .filter(|unit| match options.filter.as_deref() {
            Some(filter) => unit.matches_filter(filter),
            None => true,
        })
        .collect();

    let mut results = Vec::with_capacity(selected.len());
    for unit in &selected {
        tracing::debug!(unit = %unit.id, "executing chart script");
        results.push(execute(unit, &settings));
    }

    let valid_count = results
        .iter()
        .filter(|result| result.verdict.is_valid())
        .count();
    Ok(RunReport {
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at_epoch_ms: now_epoch_ms()?,
        root: discovery.root,
        filter: options.filter.clone(),
        discovered_count,
        selected_count: selected.len(),
        min_units: config.min_units,
        floor_ok: floor_met,
        issues: discovery.issues,
        invalid_count: results.len() - valid_count,
        valid_count,
        results,
    })
}
