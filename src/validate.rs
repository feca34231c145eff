//! Verdict classification for executed chart scripts.
//!
//! Checks run in a fixed order so a report names the first contract clause
//! that broke:
//! - **Spawn**: the interpreter could not be started.
//! - **Timeout**: the script was killed at the time bound.
//! - **Exit**: non-zero status or death by signal.
//! - **Artifact**: missing, at or below the size threshold, or left over from
//!   an earlier run.
//!
//! ```text
//! bar.py exits 0, writes bar.pdf (2000 bytes)  -> valid
//! bar.py exits 0, writes nothing               -> invalid (artifact missing)
//! bar.py exits 0, writes bar.pdf (10 bytes)    -> invalid (artifact below size threshold)
//! bar.py loops forever                         -> invalid (timeout)
//! ```

use crate::schema::{InvalidReason, Verdict};

/// Facts gathered from one execution, before judgement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Observation {
    pub spawn_error: Option<String>,
    pub timed_out: bool,
    pub timeout_seconds: u64,
    pub exit_code: Option<i32>,
    pub exit_signal: Option<i32>,
    pub artifact: Option<ArtifactState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactState {
    pub size_bytes: u64,
    /// Written or rewritten by this run.
    pub refreshed: bool,
}

/// Judge one execution against the chart-script contract.
pub fn classify(observation: &Observation, min_artifact_bytes: u64) -> Verdict {
    if let Some(message) = &observation.spawn_error {
        return Verdict::Invalid(InvalidReason::SpawnFailed {
            message: message.clone(),
        });
    }
    if observation.timed_out {
        return Verdict::Invalid(InvalidReason::Timeout {
            timeout_seconds: observation.timeout_seconds,
        });
    }
    if observation.exit_code != Some(0) {
        return Verdict::Invalid(InvalidReason::ExitFailure {
            exit_code: observation.exit_code,
            exit_signal: observation.exit_signal,
        });
    }
    let Some(artifact) = &observation.artifact else {
        return Verdict::Invalid(InvalidReason::ArtifactMissing);
    };
    if artifact.size_bytes <= min_artifact_bytes {
        return Verdict::Invalid(InvalidReason::ArtifactTooSmall {
            size_bytes: artifact.size_bytes,
            min_bytes: min_artifact_bytes,
        });
    }
    if !artifact.refreshed {
        return Verdict::Invalid(InvalidReason::ArtifactStale);
    }
    Verdict::Valid
}
