use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Subcommand and parameters recorded next to a run artifact.
pub struct Payload {
    pub command: &'static str,
    pub params: Value,
}

impl Payload {
    pub fn new(command: &'static str, params: Value) -> Self {
        Self { command, params }
    }
}

/// Contents of `<stem>.provenance.json`.
#[derive(Serialize)]
struct Sidecar<'a> {
    code_rev: String,
    graphcut_version: &'static str,
    command: &'static str,
    params: &'a Value,
    outputs: Vec<String>,
}

/// Write `summary` as pretty JSON to `out`, creating parent directories.
pub fn write_summary<T: Serialize>(out: &Path, summary: &T) -> Result<()> {
    ensure_parent(out)?;
    fs::write(out, serde_json::to_vec_pretty(summary)?)
        .with_context(|| format!("writing {}", out.display()))
}

/// Record how `artifact` was produced in a sidecar file next to it.
pub fn write_sidecar(artifact: &Path, payload: Payload) -> Result<PathBuf> {
    let path = sidecar_path(artifact);
    ensure_parent(&path)?;
    let doc = Sidecar {
        code_rev: current_git_rev(),
        graphcut_version: graphcut::VERSION,
        command: payload.command,
        params: &payload.params,
        outputs: vec![artifact.display().to_string()],
    };
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)
            .with_context(|| format!("creating output dir {}", dir.display())),
        _ => Ok(()),
    }
}

/// `runs/flow.json` -> `runs/flow.provenance.json`.
fn sidecar_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("provenance.json")
}

/// `GIT_COMMIT` if set, else `git rev-parse HEAD`, else `"unknown"`.
pub fn current_git_rev() -> String {
    std::env::var("GIT_COMMIT")
        .ok()
        .filter(|rev| !rev.is_empty())
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_string())
}

fn git_head() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let rev = String::from_utf8(output.stdout).ok()?;
    Some(rev.trim().to_string())
}
