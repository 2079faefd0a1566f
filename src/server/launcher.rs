//! Request validation and subprocess execution for the launcher.
//!
//! A request names a legacy script (`bao.py`, ...). It is checked in three
//! steps (shape, path containment under the virtual `scripts/` root,
//! allow-list) and then served by re-running the `phiz` binary as
//! `phiz run <analysis>` in its own process with a wall-clock timeout.

use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::AnalysisKind;

/// Script names the launcher will run.
pub const ALLOWED_SCRIPTS: [&str; 6] = [
    "CMB.py",
    "Cosmic_Chronometers.py",
    "SNIa.py",
    "bao.py",
    "cluster_deficit_calc.py",
    "galaxy_2pcf_check.py",
];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How to start one analysis process.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Executable to run, normally the current `phiz` binary.
    pub program: PathBuf,
    /// Arguments placed before the analysis id (`["run"]` for `phiz`).
    pub base_args: Vec<String>,
    /// Forwarded as `--data-dir` when set.
    pub data_dir: Option<PathBuf>,
    pub timeout: Duration,
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Invalid or missing scriptName.")]
    InvalidScriptName,

    #[error("Unauthorized script path.")]
    UnauthorizedPath,

    #[error("Script is not in the list of allowed scripts.")]
    NotAllowed,

    #[error("Internal Server Error: {0}")]
    Spawn(String),

    #[error("analysis timed out after {} s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl InvocationError {
    pub fn status(&self) -> StatusCode {
        match self {
            InvocationError::InvalidScriptName => StatusCode::BAD_REQUEST,
            InvocationError::UnauthorizedPath | InvocationError::NotAllowed => {
                StatusCode::FORBIDDEN
            }
            InvocationError::Spawn(_) | InvocationError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// JSON body returned to the caller.
    pub fn body(&self) -> Value {
        match self {
            InvocationError::Timeout(_) => json!({
                "success": false,
                "output": "",
                "error": self.to_string(),
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

/// Extract `scriptName` from a JSON body. Anything else is a 400.
pub fn parse_script_name(body: &[u8]) -> Result<String, InvocationError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| InvocationError::InvalidScriptName)?;
    match value.get("scriptName").and_then(Value::as_str) {
        Some(name) if !name.is_empty() && name.ends_with(".py") => Ok(name.to_string()),
        _ => Err(InvocationError::InvalidScriptName),
    }
}

/// Check containment and the allow-list, then map to an analysis.
pub fn resolve_script(name: &str) -> Result<AnalysisKind, InvocationError> {
    if !stays_under_root(Path::new(name)) {
        return Err(InvocationError::UnauthorizedPath);
    }
    if !ALLOWED_SCRIPTS.contains(&name) {
        return Err(InvocationError::NotAllowed);
    }
    AnalysisKind::from_script_name(name).ok_or(InvocationError::NotAllowed)
}

/// Lexically resolve `name` against the scripts root; `false` if it escapes.
fn stays_under_root(name: &Path) -> bool {
    let mut depth = 0usize;
    for component in name.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

/// Run one analysis to completion, or kill it when the timeout elapses.
pub async fn launch(
    config: &LauncherConfig,
    kind: AnalysisKind,
) -> Result<ScriptOutcome, InvocationError> {
    let mut cmd = tokio::process::Command::new(&config.program);
    cmd.args(&config.base_args).arg(kind.id());
    if let Some(dir) = &config.data_dir {
        cmd.arg("--data-dir").arg(dir);
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let started = Instant::now();
    let child = cmd
        .spawn()
        .map_err(|e| InvocationError::Spawn(e.to_string()))?;

    let output = match tokio::time::timeout(config.timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| InvocationError::Spawn(e.to_string()))?,
        Err(_) => {
            log::warn!("{} killed after {:?}", kind.id(), config.timeout);
            return Err(InvocationError::Timeout(config.timeout));
        }
    };

    let outcome = ScriptOutcome {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    log::info!(
        "{} finished with exit code {:?} in {:.2}s",
        kind.id(),
        outcome.exit_code,
        started.elapsed().as_secs_f64()
    );
    Ok(outcome)
}

/// Full request cycle: validate, run, and build the status + JSON reply.
pub async fn run_script(config: &LauncherConfig, body: &[u8]) -> (StatusCode, Value) {
    let result = async {
        let name = parse_script_name(body)?;
        let kind = resolve_script(&name)?;
        launch(config, kind).await
    }
    .await;

    match result {
        Ok(outcome) if outcome.success => (
            StatusCode::OK,
            json!({ "success": true, "output": outcome.stdout }),
        ),
        Ok(outcome) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "success": false,
                "output": outcome.stdout,
                "error": outcome.stderr,
            }),
        ),
        Err(err) => {
            log::info!("rejected launcher request: {err}");
            (err.status(), err.body())
        }
    }
}
