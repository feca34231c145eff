//! Shared test infrastructure for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Script body that writes a PDF-sized artifact named `<stem>.pdf`.
#[allow(dead_code)]
pub fn writes_artifact(stem: &str, bytes: usize) -> String {
    format!("printf '%{bytes}s' '' > {stem}.pdf\n")
}

/// A throwaway lesson tree whose chart scripts are `sh` scripts.
pub struct CourseTree {
    pub dir: TempDir,
}

impl CourseTree {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let tree = Self { dir };
        tree.write(
            "chartcheck.json",
            r#"{"schema_version":1,"interpreter":"sh","script_ext":"sh","timeout_seconds":2,"min_units":0}"#,
        );
        tree
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent directory");
        }
        std::fs::write(&path, contents.as_bytes()).expect("write file");
        path
    }

    /// Add `<lesson>/<topic>/<stem>.sh` where `topic` is `<ordinal>_<stem>`.
    pub fn add_chart(&self, lesson: &str, topic: &str, body: &str) -> PathBuf {
        let stem = topic
            .split_once('_')
            .map(|(_, stem)| stem)
            .expect("topic has ordinal prefix");
        self.write(&format!("{lesson}/{topic}/{stem}.sh"), body)
    }

    pub fn chartcheck(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_chartcheck"))
            .args(args)
            .arg("--root")
            .arg(self.root())
            .env_remove("CHARTCHECK_LOG")
            .output()
            .expect("run chartcheck")
    }
}

#[allow(dead_code)]
pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[allow(dead_code)]
pub fn json_of(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "parse JSON output: {err}\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
