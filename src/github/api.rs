// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Trait seam for the remote activity source plus token discovery and backend selection
// role: github/api
// inputs: env GITHUB_TOKEN / GH_TOKEN; optional `gh` CLI; env WAR_TEST_GITHUB_JSON for the fixture backend
// outputs: Box<dyn GithubApi> (HTTP or fixture); one page of raw JSON records per listing call
// side_effects: Spawns `gh auth token` when env tokens are absent
// invariants:
// - list_pulls pages are ordered by creation time, newest first
// - Token discovery prefers GITHUB_TOKEN, then GH_TOKEN, then `gh auth token`
// - Token values never reach Debug output or logs
// errors: ApiError per call; build_api fails only when no backend can be chosen
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::github::error::ApiError;
use crate::github::fixture::{GithubFixtureApi, FIXTURE_ENV};
use crate::github::http::GithubHttpApi;
use crate::github::repo::RepoId;

/// One page of a paginated listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
  pub items: Vec<serde_json::Value>,
  pub has_next: bool,
}

/// State bucket for pull request listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullState {
  Open,
  Closed,
}

impl PullState {
  pub fn as_str(&self) -> &'static str {
    match self {
      PullState::Open => "open",
      PullState::Closed => "closed",
    }
  }
}

// --- Trait seam for the remote activity source ---
//
// Pages are 1-based. Implementations are shared across worker threads.
pub trait GithubApi: Sync {
  /// PRs in `state`, newest-created first.
  fn list_pulls(&self, repo: &RepoId, state: PullState, page: u32) -> Result<Page, ApiError>;
  fn get_pull(&self, repo: &RepoId, number: u64) -> Result<serde_json::Value, ApiError>;
  /// Commits whose date falls inside `[since, until]`, filtered remotely.
  fn list_commits(
    &self,
    repo: &RepoId,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    page: u32,
  ) -> Result<Page, ApiError>;
  fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<serde_json::Value, ApiError>;
  /// Currently open issues; pull requests are included and carry a `pull_request` marker.
  fn list_open_issues(&self, repo: &RepoId, page: u32) -> Result<Page, ApiError>;
}

/// Opaque credential for the remote source.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
  pub fn new(raw: impl Into<String>) -> Self {
    Self(raw.into())
  }

  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("Token(***)")
  }
}

/// Discover a GitHub token: env vars first, then `gh auth token` if available.
pub fn get_github_token() -> Option<Token> {
  for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
    if let Ok(t) = std::env::var(var) {
      if !t.trim().is_empty() {
        return Some(Token::new(t.trim()));
      }
    }
  }

  if let Ok(output) = std::process::Command::new("gh").args(["auth", "token"]).output() {
    if output.status.success() {
      let t = String::from_utf8_lossy(&output.stdout).trim().to_string();

      if !t.is_empty() {
        return Some(Token::new(t));
      }
    }
  }

  None
}

fn env_wants_fixture() -> bool {
  std::env::var(FIXTURE_ENV).is_ok_and(|v| !v.trim().is_empty())
}

/// Choose the backend: fixture when `WAR_TEST_GITHUB_JSON` is set, otherwise HTTP with a token.
pub fn build_api(token: Option<Token>, timeout: Duration) -> Result<Box<dyn GithubApi>> {
  if env_wants_fixture() {
    tracing::debug!("using fixture GitHub backend from {}", FIXTURE_ENV);
    return Ok(Box::new(GithubFixtureApi::from_env()?));
  }

  match token {
    Some(t) => Ok(Box::new(GithubHttpApi::new(t, timeout))),
    None => bail!("Missing token. Set GITHUB_TOKEN or run: gh auth login"),
  }
}
