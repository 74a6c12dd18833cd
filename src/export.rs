// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Persist and reload ActivityReport as pretty JSON
// role: export/persistence
// inputs: &ActivityReport, target path; env REPORT_OUTPUT_DIR for the default location
// outputs: UTF-8 JSON file (2-space pretty print) with stable field names
// side_effects: Creates parent directories; writes or reads one file
// invariants:
// - Optional fields are written as explicit null; derived aggregates are never written
// - load_report(save_report(r)) is structurally equal to r
// errors: IO and serde failures wrapped with the offending path
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::model::ActivityReport;

pub const OUTPUT_DIR_ENV: &str = "REPORT_OUTPUT_DIR";
const DEFAULT_OUTPUT_DIR: &str = "./reports";

pub fn to_json_string(report: &ActivityReport) -> Result<String> {
  serde_json::to_string_pretty(report).context("serializing activity report")
}

pub fn save_report(report: &ActivityReport, path: &Path) -> Result<()> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }

  let mut json = to_json_string(report)?;
  json.push('\n');
  std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;

  tracing::info!(path = %path.display(), "exported activity report");
  Ok(())
}

pub fn load_report(path: &Path) -> Result<ActivityReport> {
  let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&text).with_context(|| format!("parsing activity report {}", path.display()))
}

/// `$REPORT_OUTPUT_DIR/github_activity_YYYY-MM-DD.json` (directory defaults to `./reports`).
pub fn default_export_path(now: DateTime<Utc>) -> PathBuf {
  let dir = std::env::var(OUTPUT_DIR_ENV)
    .ok()
    .filter(|d| !d.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

  PathBuf::from(dir).join(format!("github_activity_{}.json", now.format("%Y-%m-%d")))
}
