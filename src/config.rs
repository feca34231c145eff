//! Harness configuration helpers.
//!
//! The config lives next to the lessons as `chartcheck.json`; every field has
//! a default so a tree without a config file still validates.
use crate::naming::{Convention, DEFAULT_LESSON_PATTERN};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `chartcheck.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Config file name, resolved relative to the lesson root.
pub const CONFIG_FILE_NAME: &str = "chartcheck.json";

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_MIN_ARTIFACT_BYTES: u64 = 1024;
pub const DEFAULT_MIN_UNITS: usize = 40;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;
pub const DEFAULT_LINT_SAMPLE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub schema_version: u32,
    pub convention: Convention,
    /// Command line used to run each script; the script path is appended.
    pub interpreter: String,
    pub script_ext: String,
    pub artifact_ext: String,
    pub lesson_pattern: String,
    pub timeout_seconds: u64,
    pub min_artifact_bytes: u64,
    /// Discovery floor for unfiltered runs; `0` disables the check.
    pub min_units: usize,
    pub max_output_bytes: usize,
    pub lint: LintConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Number of leading units to lint; `0` lints every unit.
    pub sample: usize,
    pub palette: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            convention: Convention::Derived,
            interpreter: "python3".to_string(),
            script_ext: "py".to_string(),
            artifact_ext: "pdf".to_string(),
            lesson_pattern: DEFAULT_LESSON_PATTERN.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            min_artifact_bytes: DEFAULT_MIN_ARTIFACT_BYTES,
            min_units: DEFAULT_MIN_UNITS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            lint: LintConfig::default(),
        }
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            sample: DEFAULT_LINT_SAMPLE,
            palette: ["MLPURPLE", "MLBLUE", "MLORANGE", "MLGREEN"]
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl HarnessConfig {
    /// Compile the lesson directory pattern.
    pub fn lesson_regex(&self) -> Result<Regex> {
        Regex::new(&self.lesson_pattern)
            .with_context(|| format!("compile lesson_pattern {:?}", self.lesson_pattern))
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

/// Render a pretty JSON config stub for `chartcheck init`.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&HarnessConfig::default()).context("serialize config stub")
}

/// Load `chartcheck.json` from the root, falling back to defaults.
pub fn load_config(root: &Path) -> Result<HarnessConfig> {
    let path = config_path(root);
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        return Ok(HarnessConfig::default());
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: HarnessConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(root: &Path, config: &HarnessConfig) -> Result<PathBuf> {
    let path = config_path(root);
    fs::create_dir_all(root).with_context(|| format!("create root {}", root.display()))?;
    let text = serde_json::to_string_pretty(config).context("serialize harness config")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

pub fn validate_config(config: &HarnessConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported chartcheck config schema_version {}",
            config.schema_version
        ));
    }
    if config.timeout_seconds == 0 {
        return Err(anyhow!("timeout_seconds must be greater than zero"));
    }
    let interpreter = shell_words::split(&config.interpreter)
        .with_context(|| format!("parse interpreter {:?}", config.interpreter))?;
    if interpreter.is_empty() {
        return Err(anyhow!("interpreter must not be empty"));
    }
    if config.script_ext.is_empty() || config.artifact_ext.is_empty() {
        return Err(anyhow!("script_ext and artifact_ext must not be empty"));
    }
    config.lesson_regex()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(dir.path()).expect("load defaults");
        assert_eq!(config, HarnessConfig::default());
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.min_artifact_bytes, 1024);
        assert_eq!(config.min_units, 40);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            config_path(dir.path()),
            r#"{"schema_version":1,"timeout_seconds":5,"convention":{"kind":"fixed"}}"#,
        )
        .expect("write config");
        let config = load_config(dir.path()).expect("load config");
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.interpreter, "python3");
        assert!(matches!(config.convention, Convention::Fixed { .. }));
    }

    #[test]
    fn stub_round_trips_through_write_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = HarnessConfig {
            interpreter: "uv run python".to_string(),
            ..HarnessConfig::default()
        };
        write_config(dir.path(), &config).expect("write config");
        assert_eq!(load_config(dir.path()).expect("load"), config);
        assert!(config_stub().expect("stub").contains("\"timeout_seconds\": 60"));
    }

    #[test]
    fn rejects_invalid_settings() {
        let invalid = [
            HarnessConfig {
                schema_version: 99,
                ..HarnessConfig::default()
            },
            HarnessConfig {
                timeout_seconds: 0,
                ..HarnessConfig::default()
            },
            HarnessConfig {
                interpreter: "   ".to_string(),
                ..HarnessConfig::default()
            },
            HarnessConfig {
                lesson_pattern: "(".to_string(),
                ..HarnessConfig::default()
            },
        ];
        for config in &invalid {
            assert!(validate_config(config).is_err(), "accepted {config:?}");
        }
        validate_config(&HarnessConfig::default()).expect("defaults are valid");
    }
}
