// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: GitHub REST backend for GithubApi (ureq), one request per page
// role: github/http
// inputs: Token, global timeout, base URL (api.github.com unless overridden in tests)
// outputs: Page (items + has_next from the Link header) or a single JSON record
// side_effects: Network calls to the GitHub REST API
// invariants:
// - per_page=100; has_next is true only when the Link header carries rel="next"
// - Pull listings request sort=created&direction=desc
// - Non-2xx statuses map through ApiError::from_status; no retries
// errors: Transport for network/timeouts, Decode for unreadable or non-array listings
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ext::serde_json::JsonFetch;
use crate::github::api::{GithubApi, Page, PullState, Token};
use crate::github::error::ApiError;
use crate::github::repo::RepoId;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
const PER_PAGE: u32 = 100;
const USER_AGENT: &str = "weekly-activity-report";

pub struct GithubHttpApi {
  agent: ureq::Agent,
  token: Token,
  base_url: String,
}

impl GithubHttpApi {
  pub fn new(token: Token, timeout: Duration) -> Self {
    Self::with_base_url(token, timeout, DEFAULT_BASE_URL)
  }

  pub fn with_base_url(token: Token, timeout: Duration, base_url: impl Into<String>) -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .timeout_global(Some(timeout))
      .http_status_as_error(false)
      .build()
      .into();

    Self {
      agent,
      token,
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  fn get(&self, path_and_query: &str) -> Result<(serde_json::Value, bool), ApiError> {
    let url = format!("{}{}", self.base_url, path_and_query);
    tracing::debug!(%url, "GET");

    let mut resp = self
      .agent
      .get(&url)
      .header("Accept", "application/vnd.github+json")
      .header("User-Agent", USER_AGENT)
      .header("X-GitHub-Api-Version", "2022-11-28")
      .header("Authorization", &format!("Bearer {}", self.token.expose()))
      .call()
      .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = resp.status().as_u16();
    let header = |name: &str| {
      resp
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    };
    let link = header("link");
    let remaining = header("x-ratelimit-remaining").and_then(|v| v.trim().parse::<u64>().ok());
    let reset = header("x-ratelimit-reset").and_then(|v| v.trim().parse::<i64>().ok());

    if !(200..300).contains(&status) {
      let body = resp.body_mut().read_to_string().unwrap_or_default();
      return Err(ApiError::from_status(status, error_message(&body), remaining, reset));
    }

    let value = resp
      .body_mut()
      .read_json::<serde_json::Value>()
      .map_err(|e| ApiError::Decode(e.to_string()))?;

    Ok((value, link_has_next(link.as_deref())))
  }

  fn get_page(&self, path_and_query: &str) -> Result<Page, ApiError> {
    let (value, has_next) = self.get(path_and_query)?;

    match value {
      serde_json::Value::Array(items) => Ok(Page { items, has_next }),
      other => Err(ApiError::Decode(format!(
        "expected a JSON array from {}, got {}",
        path_and_query,
        json_kind(&other)
      ))),
    }
  }
}

impl GithubApi for GithubHttpApi {
  fn list_pulls(&self, repo: &RepoId, state: PullState, page: u32) -> Result<Page, ApiError> {
    self.get_page(&format!(
      "/repos/{}/{}/pulls?state={}&sort=created&direction=desc&per_page={}&page={}",
      repo.owner(),
      repo.name(),
      state.as_str(),
      PER_PAGE,
      page
    ))
  }

  fn get_pull(&self, repo: &RepoId, number: u64) -> Result<serde_json::Value, ApiError> {
    self
      .get(&format!("/repos/{}/{}/pulls/{}", repo.owner(), repo.name(), number))
      .map(|(v, _)| v)
  }

  fn list_commits(
    &self,
    repo: &RepoId,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    page: u32,
  ) -> Result<Page, ApiError> {
    self.get_page(&format!(
      "/repos/{}/{}/commits?since={}&until={}&per_page={}&page={}",
      repo.owner(),
      repo.name(),
      iso_z(since),
      iso_z(until),
      PER_PAGE,
      page
    ))
  }

  fn get_commit(&self, repo: &RepoId, sha: &str) -> Result<serde_json::Value, ApiError> {
    self
      .get(&format!("/repos/{}/{}/commits/{}", repo.owner(), repo.name(), sha))
      .map(|(v, _)| v)
  }

  fn list_open_issues(&self, repo: &RepoId, page: u32) -> Result<Page, ApiError> {
    self.get_page(&format!(
      "/repos/{}/{}/issues?state=open&per_page={}&page={}",
      repo.owner(),
      repo.name(),
      PER_PAGE,
      page
    ))
  }
}

fn iso_z(dt: DateTime<Utc>) -> String {
  dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// True when a `Link` header advertises a `rel="next"` page.
pub fn link_has_next(link: Option<&str>) -> bool {
  static RE_NEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<[^>]+>\s*;\s*rel="next""#).expect("static link regex"));

  link.is_some_and(|l| RE_NEXT.is_match(l))
}

/// Prefer GitHub's `{"message": ...}` error body; fall back to a clipped raw body.
fn error_message(body: &str) -> String {
  if let Ok(v) = serde_json::from_str::<serde_json::Value>(body) {
    if let Some(msg) = v.fetch("message").to::<String>() {
      return msg;
    }
  }

  body.chars().take(200).collect::<String>().trim().to_string()
}

fn json_kind(v: &serde_json::Value) -> &'static str {
  match v {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "bool",
    serde_json::Value::Number(_) => "number",
    serde_json::Value::String(_) => "string",
    serde_json::Value::Array(_) => "array",
    serde_json::Value::Object(_) => "object",
  }
}
