//! Isolated execution of a single chart script.
//!
//! Each script runs as its own process with its topic directory as the working
//! directory, no arguments, and a hard time bound. Output pipes are drained on
//! reader threads while the parent polls for exit.
use crate::config::HarnessConfig;
use crate::schema::{ChartScript, ValidationResult};
use crate::util::{bounded_output, sha256_hex};
use crate::validate::{classify, ArtifactState, Observation};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// Minimum wait for output pipes to close once the script has exited.
const PIPE_GRACE: Duration = Duration::from_millis(500);

/// Per-run execution settings derived from the harness config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSettings {
    /// Interpreter argv; the script path is appended.
    pub interpreter: Vec<String>,
    pub timeout: Duration,
    pub min_artifact_bytes: u64,
    pub max_output_bytes: usize,
}

impl ExecSettings {
    pub fn from_config(config: &HarnessConfig) -> Result<Self> {
        let interpreter = shell_words::split(&config.interpreter)
            .with_context(|| format!("parse interpreter {:?}", config.interpreter))?;
        if interpreter.is_empty() {
            return Err(anyhow!("interpreter must not be empty"));
        }
        Ok(Self {
            interpreter,
            timeout: Duration::from_secs(config.timeout_seconds),
            min_artifact_bytes: config.min_artifact_bytes,
            max_output_bytes: config.max_output_bytes,
        })
    }
}

struct ScriptRun {
    status: ExitStatus,
    timed_out: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Run one chart script and judge its side effects.
///
/// Per-unit failures (including a missing interpreter) are folded into the
/// returned verdict; this never fails the sweep.
pub fn execute(unit: &ChartScript, settings: &ExecSettings) -> ValidationResult {
    let artifact_path = unit.artifact_path();
    let before = modified_at(&artifact_path);

    let start = Instant::now();
    let run = run_script(unit, settings);
    let duration_ms = start.elapsed().as_millis();

    let mut observation = Observation {
        timeout_seconds: settings.timeout.as_secs(),
        ..Observation::default()
    };
    let (stdout, stderr) = match run {
        Ok(run) => {
            observation.timed_out = run.timed_out;
            observation.exit_code = run.status.code();
            observation.exit_signal = exit_signal(&run.status);
            (
                bounded_output(&run.stdout, settings.max_output_bytes),
                bounded_output(&run.stderr, settings.max_output_bytes),
            )
        }
        Err(err) => {
            observation.spawn_error = Some(format!("{err:#}"));
            (String::new(), String::new())
        }
    };

    let artifact = inspect_artifact(&artifact_path, before);
    observation.artifact = artifact.as_ref().map(|(state, _)| state.clone());
    let verdict = classify(&observation, settings.min_artifact_bytes);

    tracing::info!(
        unit = %unit.id,
        duration_ms,
        exit_code = ?observation.exit_code,
        timed_out = observation.timed_out,
        valid = verdict.is_valid(),
        "chart script executed"
    );

    ValidationResult {
        unit_id: unit.id.clone(),
        directory_path: unit.directory_path.clone(),
        script_path: unit.script_path.clone(),
        exit_code: observation.exit_code,
        exit_signal: observation.exit_signal,
        timed_out: observation.timed_out,
        duration_ms,
        stdout,
        stderr,
        artifact_exists: artifact.is_some(),
        artifact_size_bytes: artifact
            .as_ref()
            .map(|(state, _)| state.size_bytes)
            .unwrap_or(0),
        artifact_sha256: artifact.and_then(|(_, digest)| digest),
        verdict,
    }
}

fn run_script(unit: &ChartScript, settings: &ExecSettings) -> Result<ScriptRun> {
    let (program, args) = settings
        .interpreter
        .split_first()
        .ok_or_else(|| anyhow!("interpreter is empty"))?;
    let program = resolve_program(program)?;

    let mut cmd = Command::new(&program);
    cmd.args(args)
        .arg(&unit.script_path)
        .current_dir(&unit.directory_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    isolate_process_group(&mut cmd);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawn {} {}", program.display(), unit.script_path.display()))?;
    let pid = child.id();
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let start = Instant::now();
    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child.try_wait().context("check script status")? {
            break status;
        }
        if start.elapsed() > settings.timeout {
            timed_out = true;
            tracing::warn!(unit = %unit.id, timeout_secs = settings.timeout.as_secs(), "chart script timed out");
            kill_process_group(pid);
            let _ = child.kill();
            break child.wait().context("reap timed-out script")?;
        }
        thread::sleep(POLL_INTERVAL);
    };
    // Background jobs left in the script's group would otherwise hold the pipes open.
    kill_process_group(pid);

    let deadline = (start + settings.timeout).max(Instant::now() + PIPE_GRACE);
    let stdout = collect(stdout_reader, deadline);
    let stderr = collect(stderr_reader, deadline);
    if stdout.is_none() || stderr.is_none() {
        tracing::warn!(unit = %unit.id, "output pipes still open after script exit");
        timed_out = true;
    }

    Ok(ScriptRun {
        status,
        timed_out,
        stdout: stdout.unwrap_or_default(),
        stderr: stderr.unwrap_or_default(),
    })
}

/// Resolve the interpreter program on `PATH` (or as a literal path).
pub fn resolve_program(program: &str) -> Result<PathBuf> {
    which::which(program).with_context(|| format!("resolve interpreter {program:?}"))
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<Vec<u8>>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
        rx
    })
}

/// Wait for a drained pipe until `deadline`; `None` if it is still held open.
fn collect(reader: Option<Receiver<Vec<u8>>>, deadline: Instant) -> Option<Vec<u8>> {
    let Some(reader) = reader else {
        return Some(Vec::new());
    };
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
    }
}

#[cfg(unix)]
fn isolate_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    // The script leads its own group, so the negative pid reaches every descendant.
    if let Ok(pid) = libc::pid_t::try_from(pid) {
        // SAFETY: kill(2) has no memory-safety preconditions.
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[cfg(unix)]
fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn inspect_artifact(
    path: &Path,
    before: Option<SystemTime>,
) -> Option<(ArtifactState, Option<String>)> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    let refreshed = match (before, meta.modified().ok()) {
        (None, _) => true,
        (Some(before), Some(after)) => after > before,
        (Some(_), None) => false,
    };
    let digest = fs::read(path).ok().map(|bytes| sha256_hex(&bytes));
    Some((
        ArtifactState {
            size_bytes: meta.len(),
            refreshed,
        },
        digest,
    ))
}

#[cfg(all(test, unix))]
#[path = "execute_tests.rs"]
mod tests;
