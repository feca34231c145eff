//! Schema types for discovered units, execution results, and reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Current schema version for JSON run and discovery reports.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// One discoverable chart script and the artifact it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartScript {
    /// `<lesson>/<topic>`, used for display and `--filter` matching.
    pub id: String,
    pub lesson: String,
    pub topic: String,
    pub directory_path: PathBuf,
    pub script_path: PathBuf,
    pub expected_artifact_name: String,
}

impl ChartScript {
    pub fn artifact_path(&self) -> PathBuf {
        self.directory_path.join(&self.expected_artifact_name)
    }

    pub fn matches_filter(&self, filter: &str) -> bool {
        self.id.contains(filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryIssue {
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: DiscoveryIssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryIssueKind {
    /// Topic directory without an ordinal prefix.
    MalformedName,
    /// The expected script file is absent.
    MissingScript { expected: String },
    /// A sibling directory already claimed the same derived name.
    DuplicateName { name: String, first: PathBuf },
    /// The lesson directory could not be listed.
    Unreadable { message: String },
}

impl fmt::Display for DiscoveryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiscoveryIssueKind::MalformedName => write!(
                f,
                "{}: directory name has no ordinal prefix or is not valid UTF-8",
                self.path.display()
            ),
            DiscoveryIssueKind::MissingScript { expected } => {
                write!(f, "{}: missing script {expected}", self.path.display())
            }
            DiscoveryIssueKind::DuplicateName { name, first } => write!(
                f,
                "{}: derived name {name:?} already used by {}",
                self.path.display(),
                first.display()
            ),
            DiscoveryIssueKind::Unreadable { message } => {
                write!(f, "{}: unreadable: {message}", self.path.display())
            }
        }
    }
}

/// Why an executed unit failed its contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum InvalidReason {
    SpawnFailed { message: String },
    Timeout { timeout_seconds: u64 },
    ExitFailure {
        exit_code: Option<i32>,
        exit_signal: Option<i32>,
    },
    ArtifactMissing,
    ArtifactTooSmall { size_bytes: u64, min_bytes: u64 },
    ArtifactStale,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::SpawnFailed { message } => write!(f, "spawn failed: {message}"),
            InvalidReason::Timeout { .. } => f.write_str("timeout"),
            InvalidReason::ExitFailure {
                exit_code: Some(code),
                ..
            } => write!(f, "script exited with status {code}"),
            InvalidReason::ExitFailure {
                exit_signal: Some(signal),
                ..
            } => write!(f, "terminated by signal {signal}"),
            InvalidReason::ExitFailure { .. } => f.write_str("script exited abnormally"),
            InvalidReason::ArtifactMissing => f.write_str("artifact missing"),
            InvalidReason::ArtifactTooSmall { .. } => f.write_str("artifact below size threshold"),
            InvalidReason::ArtifactStale => f.write_str("artifact not updated"),
        }
    }
}

/// Terminal state of an executed unit; units are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    Valid,
    Invalid(InvalidReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Outcome of running one chart script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub unit_id: String,
    pub directory_path: PathBuf,
    pub script_path: PathBuf,
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_signal: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u128,
    pub stdout: String,
    pub stderr: String,
    pub artifact_exists: bool,
    pub artifact_size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_sha256: Option<String>,
    pub verdict: Verdict,
}

/// Aggregated outcome of one `chartcheck run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub generated_at_epoch_ms: u128,
    pub root: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    pub discovered_count: usize,
    pub selected_count: usize,
    pub min_units: usize,
    pub floor_ok: bool,
    pub issues: Vec<DiscoveryIssue>,
    pub results: Vec<ValidationResult>,
    pub valid_count: usize,
    pub invalid_count: usize,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.floor_ok && self.issues.is_empty() && self.invalid_count == 0
    }
}

/// Output of `chartcheck discover`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub schema_version: u32,
    pub root: PathBuf,
    pub min_units: usize,
    pub floor_ok: bool,
    pub units: Vec<ChartScript>,
    pub issues: Vec<DiscoveryIssue>,
}

impl DiscoveryReport {
    pub fn passed(&self) -> bool {
        self.floor_ok && self.issues.is_empty()
    }
}

/// Discovery floor: `0` disables the check.
pub fn floor_ok(discovered: usize, min_units: usize) -> bool {
    min_units == 0 || discovered >= min_units
}
