//! Directory-name conventions for lessons and chart topics.
//!
//! Everything here is pure string handling so the convention can change
//! without touching the directory walk or the executor.
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Default lesson directory pattern (`L01_Introduction`, `W3_Agents`, ...).
pub const DEFAULT_LESSON_PATTERN: &str = r"^[A-Za-z]\d+_.+$";
/// Default script name under the fixed convention.
pub const FIXED_SCRIPT_NAME: &str = "chart.py";
/// Default artifact name under the fixed convention.
pub const FIXED_ARTIFACT_NAME: &str = "chart.pdf";

/// How a topic directory maps to its script and artifact names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Convention {
    /// `01_agent_definition/agent_definition.py` -> `agent_definition.pdf`.
    #[default]
    Derived,
    /// Every topic holds the same script and artifact names.
    Fixed {
        #[serde(default = "default_fixed_script")]
        script: String,
        #[serde(default = "default_fixed_artifact")]
        artifact: String,
    },
}

fn default_fixed_script() -> String {
    FIXED_SCRIPT_NAME.to_string()
}

fn default_fixed_artifact() -> String {
    FIXED_ARTIFACT_NAME.to_string()
}

/// Script and artifact file names expected inside one topic directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedNames {
    pub script: String,
    pub artifact: String,
}

fn ordinal_regex() -> &'static Regex {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    ORDINAL.get_or_init(|| Regex::new(r"^\d+[a-z]?_(.+)$").expect("valid ordinal regex"))
}

/// Strip the ordinal token (`01_`, `03b_`) from a topic directory name.
///
/// Returns `None` when the name carries no ordinal prefix.
pub fn strip_ordinal(dir_name: &str) -> Option<&str> {
    ordinal_regex()
        .captures(dir_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolve the expected script and artifact names for a topic directory.
pub fn expected_names(
    convention: &Convention,
    dir_name: &str,
    script_ext: &str,
    artifact_ext: &str,
) -> Option<ExpectedNames> {
    let stem = strip_ordinal(dir_name)?;
    match convention {
        Convention::Derived => Some(ExpectedNames {
            script: format!("{stem}.{script_ext}"),
            artifact: format!("{stem}.{artifact_ext}"),
        }),
        Convention::Fixed { script, artifact } => Some(ExpectedNames {
            script: script.clone(),
            artifact: artifact.clone(),
        }),
    }
}

/// Key used to detect sibling topics that collapse onto the same unit.
pub fn derived_key(convention: &Convention, dir_name: &str) -> Option<String> {
    match convention {
        Convention::Derived => strip_ordinal(dir_name).map(str::to_string),
        // Fixed names never collide across directories.
        Convention::Fixed { .. } => Some(dir_name.to_string()),
    }
}

/// Directories that are never lesson or topic candidates.
pub fn is_ignored_dir(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

pub fn is_lesson_dir(name: &str, pattern: &Regex) -> bool {
    !is_ignored_dir(name) && pattern.is_match(name)
}
