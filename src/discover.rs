//! Chart-script discovery over a lesson tree.
//!
//! The walk is two levels deep: lesson directories under the root, then topic
//! directories under each lesson. Problems are collected per directory so one
//! malformed topic never hides the rest of the tree.
use crate::config::HarnessConfig;
use crate::naming;
use crate::schema::{ChartScript, DiscoveryIssue, DiscoveryIssueKind};
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Units found under a root plus every per-directory problem.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Canonical form of the scanned root.
    pub root: PathBuf,
    pub units: Vec<ChartScript>,
    pub issues: Vec<DiscoveryIssue>,
}

/// Scan `root` for chart scripts according to the configured convention.
///
/// Units come back sorted by script path. An empty tree is not an error.
pub fn discover(root: &Path, config: &HarnessConfig) -> Result<Discovery> {
    let root = root
        .canonicalize()
        .with_context(|| format!("resolve chart root {}", root.display()))?;
    if !root.is_dir() {
        return Err(anyhow!("chart root {} is not a directory", root.display()));
    }
    let lesson_pattern = config.lesson_regex()?;

    let mut discovery = Discovery {
        root: root.clone(),
        ..Discovery::default()
    };
    for (lesson, lesson_dir) in sorted_subdirs(&root)? {
        let Some(lesson) = lesson.filter(|name| naming::is_lesson_dir(name, &lesson_pattern))
        else {
            continue;
        };
        if let Err(err) = scan_lesson(&lesson, &lesson_dir, config, &mut discovery) {
            let message = format!("{err:#}");
            tracing::warn!(dir = %lesson_dir.display(), error = %message, "lesson scan failed");
            discovery.issues.push(DiscoveryIssue {
                path: lesson_dir,
                kind: DiscoveryIssueKind::Unreadable { message },
            });
        }
    }
    discovery
        .units
        .sort_by(|left, right| left.script_path.cmp(&right.script_path));

    tracing::info!(
        root = %root.display(),
        units = discovery.units.len(),
        issues = discovery.issues.len(),
        "discovery complete"
    );
    Ok(discovery)
}

fn scan_lesson(
    lesson: &str,
    lesson_dir: &Path,
    config: &HarnessConfig,
    discovery: &mut Discovery,
) -> Result<()> {
    // Derived name -> first directory that claimed it.
    let mut seen: BTreeMap<String, PathBuf> = BTreeMap::new();

    for (topic, topic_dir) in sorted_subdirs(lesson_dir)? {
        if topic.as_deref().is_some_and(naming::is_ignored_dir) {
            continue;
        }
        let Some((topic, names)) = topic.and_then(|topic| {
            let names = naming::expected_names(
                &config.convention,
                &topic,
                &config.script_ext,
                &config.artifact_ext,
            )?;
            Some((topic, names))
        }) else {
            tracing::warn!(dir = %topic_dir.display(), "malformed topic directory name");
            discovery.issues.push(DiscoveryIssue {
                path: topic_dir,
                kind: DiscoveryIssueKind::MalformedName,
            });
            continue;
        };

        let key = naming::derived_key(&config.convention, &topic).unwrap_or_else(|| topic.clone());
        if let Some(first) = seen.get(&key) {
            tracing::warn!(
                dir = %topic_dir.display(),
                first = %first.display(),
                name = %key,
                "duplicate derived name"
            );
            discovery.issues.push(DiscoveryIssue {
                path: topic_dir,
                kind: DiscoveryIssueKind::DuplicateName {
                    name: key,
                    first: first.clone(),
                },
            });
            continue;
        }
        seen.insert(key, topic_dir.clone());

        let script_path = topic_dir.join(&names.script);
        if !script_path.is_file() {
            discovery.issues.push(DiscoveryIssue {
                path: topic_dir,
                kind: DiscoveryIssueKind::MissingScript {
                    expected: names.script,
                },
            });
            continue;
        }

        tracing::debug!(script = %script_path.display(), "discovered chart script");
        discovery.units.push(ChartScript {
            id: format!("{lesson}/{topic}"),
            lesson: lesson.to_string(),
            topic,
            directory_path: topic_dir,
            script_path,
            expected_artifact_name: names.artifact,
        });
    }
    Ok(())
}

/// Subdirectories sorted by path; the name is `None` when it is not valid UTF-8.
fn sorted_subdirs(dir: &Path) -> Result<Vec<(Option<String>, PathBuf)>> {
    let entries = fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    let mut subdirs = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        subdirs.push((entry.file_name().into_string().ok(), path));
    }
    subdirs.sort_by(|left, right| left.1.cmp(&right.1));
    Ok(subdirs)
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
