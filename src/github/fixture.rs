// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Serve canned GitHub JSON through the GithubApi seam for tests and offline runs
// role: github/fixture
// inputs: JSON document keyed by "owner/name" (inline or from env WAR_TEST_GITHUB_JSON)
// outputs: Pages sliced by per_page; detail records from *_details maps or the listing itself
// side_effects: None (records every call in an in-memory log)
// invariants:
// - Pull listings are filtered by state and ordered by created_at, newest first
// - Commit listings honor [since, until] inclusively on committer date, then author date
// - Unknown repositories behave like a 404
// errors: Configured per repo via "error": {status, message, on?} or {kind: "transport", message}
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::ext::serde_json::JsonFetch;
use crate::github::api::{GithubApi, Page, PullState};
use crate::github::error::ApiError;
use crate::github::repo::RepoId;

pub const FIXTURE_ENV: &str = "WAR_TEST_GITHUB_JSON";
const DEFAULT_PER_PAGE: usize = 100;

/// Fixture-backed GithubApi.
///
/// Document shape per repository key:
/// `pulls`, `pull_details` (`{"<number>": {...}}`), `commits`, `commit_details` (`{"<sha>": {...}}`),
/// `issues`, optional `per_page`, and optional `error`.
pub struct GithubFixtureApi {
  doc: Value,
  calls: Mutex<Vec<String>>,
}

impl GithubFixtureApi {
  pub fn new(doc: Value) -> Self {
    Self {
      doc,
      calls: Mutex::new(Vec::new()),
    }
  }

  /// Read the fixture from `WAR_TEST_GITHUB_JSON`: inline JSON, or a path to a JSON file.
  pub fn from_env() -> Result<Self> {
    let raw = std::env::var(FIXTURE_ENV).with_context(|| format!("{} is not set", FIXTURE_ENV))?;
    let trimmed = raw.trim();

    let text = if trimmed.starts_with('{') {
      trimmed.to_string()
    } else {
      std::fs::read_to_string(trimmed).with_context(|| format!("reading fixture file {}", trimmed))?
    };

    let doc: Value = serde_json::from_str(&text).with_context(|| format!("parsing {} fixture", FIXTURE_ENV))?;

    Ok(Self::new(doc))
  }

  /// Every call served so far, e.g. `list_pulls acme/api closed 2`.
  #[cfg(any(test, feature = "testutil"))]
  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().map(|c| c.clone()).unwrap_or_default()
  }

  fn record(&self, call: String) {
    if let Ok(mut calls) = self.calls.lock() {
      calls.push(call);
    }
  }

  fn repo_doc(&self, repo: &RepoId, endpoint: &str) -> Result<&Value, ApiError> {
    let Some(doc) = self.doc.get(repo.full_name()) else {
      return Err(ApiError::NotFound {
        message: format!("no fixture for {}", repo),
      });
    };

    if let Some(err) = doc.get("error") {
      let scoped_to = err.fetch("on").to::<String>();

      if scoped_to.as_deref().map_or(true, |on| on == endpoint) {
        return Err(fixture_error(err));
      }
    }

    Ok(doc)
  }

  fn per_page(doc: &Value) -> usize {
    doc
      .fetch("per_page")
      .to::<usize>()
      .filter(|n| *n > 0)
      .unwrap_or(DEFAULT_PER_PAGE)
  }
}

fn fixture_error(err: &Value) -> ApiError {
  let message: String = err.fetch("message").to_or_default();

  if err.fetch("kind").to::<String>().as_deref() == Some("transport") {
    return ApiError::Transport(message);
  }

  ApiError::from_status(
    err.fetch("status").to::<u16>().unwrap_or(500),
    message,
    err.fetch("ratelimit_remaining").to::<u64>(),
    err.fetch("ratelimit_reset").to::<i64>(),
  )
}

fn paginate(items: Vec<Value>, per_page: usize, page: u32) -> Page {
  let start = (page.max(1) as usize - 1) * per_page;
  let has_next = items.len() > start + per_page;
  let items = items.into_iter().skip(start).take(per_page).collect();

  Page { items, has_next }
}

fn commit_date(c: &Value) -> Option<DateTime<Utc>> {
  c.fetch("commit.committer.date")
    .to_datetime()
    .or_else(|| c.fetch("commit.author.date").to_datetime())
}

fn listing<'a>(doc: &'a Value, key: &str) -> &'a [Value] {
  doc.fetch(key).as_array().map(Vec::as_slice).unwrap_or(&[])
}

impl GithubApi for GithubFixtureApi {
  fn list_pulls(&self, repo: &RepoId, state: PullState, page: u32) -> Result<Page, ApiError> {
    self.record(format!("list_pulls {} {} {}", repo, state.as_str(), page));
    let doc = self.repo_doc(repo, "pulls")?;

    let mut pulls: Vec<Value> = listing(doc, "pulls")
      .iter()
      .filter(|p| p.fetch("state").to::<String>().as_deref() == Some(state.as_str()))
      .cloned()
      .collect();
    // Missing or unparseable created_at sorts last.
    pulls.sort_by(|a, b| {
      let ka = a.fetch("created_at").to_datetime();
      let kb = b.fetch("created_at").to_datetime();
      kb.cmp(&ka)
    });

    Ok(paginate(pulls, Self::per_page(doc), page))
  }

  fn get_pull(&self, repo: &RepoId, number: u64) -> Result<Value, ApiError> {
    self.record(format!("get_pull {} {}", repo, number));
    let doc = self.repo_doc(repo, "pulls")?;

    if let Some(detail) = doc.get("pull_details").and_then(|d| d.get(number.to_string())) {
      return Ok(detail.clone());
    }

    listing(doc, "pulls")
      .iter()
      .find(|p| p.fetch("number").to::<u64>() == Some(number))
      .cloned()
      .ok_or_else(|| ApiError::NotFound {
        message: format!("no pull #{} in {}", number, repo),
      })
  }

  fn list_commits(
    &self,
    repo: &RepoId,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    page: u32,
  ) -> Result<Page, ApiError> {
    self.record(format!("list_commits {} {}", repo, page));
    let doc = self.repo_doc(repo, "commits")?;

    let commits: Vec<Value> = listing(doc, "commits")
      .iter()
      .filter(|c| match commit_date(c) {
        Some(d) => d >= since && d <= until,
        // The remote would have filtered these out; keep them so callers see malformed input.
        None => true,
      })
      .cloned()
      .collect();

    Ok(paginate(commits, Self::per_page(doc), page))
  }

  fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<Value, ApiError> {
    self.record(format!("get_commit {} {}", repo, sha));
    let doc = self.repo_doc(repo, "commits")?;

    if let Some(detail) = doc.get("commit_details").and_then(|d| d.get(sha)) {
      return Ok(detail.clone());
    }

    listing(doc, "commits")
      .iter()
      .find(|c| c.fetch("sha").to::<String>().as_deref() == Some(sha))
      .cloned()
      .ok_or_else(|| ApiError::NotFound {
        message: format!("no commit {} in {}", sha, repo),
      })
  }

  fn list_open_issues(&self, repo: &RepoId, page: u32) -> Result<Page, ApiError> {
    self.record(format!("list_open_issues {} {}", repo, page));
    let doc = self.repo_doc(repo, "issues")?;

    let issues: Vec<Value> = listing(doc, "issues")
      .iter()
      .filter(|i| i.fetch("state").to::<String>().map_or(true, |s| s == "open"))
      .cloned()
      .collect();

    Ok(paginate(issues, Self::per_page(doc), page))
  }
}
