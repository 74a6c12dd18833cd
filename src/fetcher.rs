// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Fetch and normalize one repository's PRs, commits and open issues for one window
// role: fetcher/normalization
// inputs: &dyn GithubApi, RepoId, Window, FetchOptions, optional shared cancel flag
// outputs: RepositoryActivity with each collection in the remote's return order
// side_effects: Remote API calls only (listing pages plus per-record detail calls when line stats are on)
// invariants:
// - PR buckets scanned open then closed; a bucket stops at the first PR created before since
// - PRs created after until are skipped and never end the scan; both window bounds are inclusive
// - Merge commits (more than one parent) are dropped before any detail call
// - Issue records carrying a non-null pull_request marker are dropped
// - Missing authors become "unknown"; records without a parseable timestamp are skipped with a warning
// errors: First ApiError aborts the whole repository fetch; Cancelled when the shared flag is raised
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::ext::serde_json::JsonFetch;
use crate::github::{ApiError, GithubApi, PullState, RepoId};
use crate::model::{Commit, Issue, IssueState, PrState, PullRequest, RepositoryActivity, UNKNOWN_AUTHOR};
use crate::window::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
  /// Fetch per-record detail for additions/deletions/changed_files.
  pub line_stats: bool,
}

impl Default for FetchOptions {
  fn default() -> Self {
    Self { line_stats: true }
  }
}

pub struct RepoFetcher<'a> {
  api: &'a dyn GithubApi,
  options: FetchOptions,
  cancel: Option<&'a AtomicBool>,
}

impl<'a> RepoFetcher<'a> {
  pub fn new(api: &'a dyn GithubApi, options: FetchOptions) -> Self {
    Self {
      api,
      options,
      cancel: None,
    }
  }

  /// Abort with `ApiError::Cancelled` before the next remote call once `flag` is raised.
  pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
    self.cancel = Some(flag);
    self
  }

  fn check_cancel(&self) -> Result<(), ApiError> {
    match self.cancel {
      Some(flag) if flag.load(Ordering::SeqCst) => Err(ApiError::Cancelled),
      _ => Ok(()),
    }
  }

  pub fn fetch(&self, repo: &RepoId, window: &Window) -> Result<RepositoryActivity, ApiError> {
    self.fetch_at(repo, window, Utc::now())
  }

  /// Like `fetch`, stamping the result with `collected_at`.
  pub fn fetch_at(
    &self,
    repo: &RepoId,
    window: &Window,
    collected_at: DateTime<Utc>,
  ) -> Result<RepositoryActivity, ApiError> {
    let pull_requests = self.fetch_pull_requests(repo, window)?;
    let commits = self.fetch_commits(repo, window)?;
    let open_issues = self.fetch_open_issues(repo)?;

    Ok(RepositoryActivity {
      repo_name: repo.full_name(),
      collected_at,
      pull_requests,
      commits,
      open_issues,
    })
  }

  pub fn fetch_pull_requests(&self, repo: &RepoId, window: &Window) -> Result<Vec<PullRequest>, ApiError> {
    let mut out = Vec::new();

    for state in [PullState::Open, PullState::Closed] {
      let mut page = 1;

      'pages: loop {
        self.check_cancel()?;
        let listing = self.api.list_pulls(repo, state, page)?;
        debug!(repo = %repo, state = state.as_str(), page, items = listing.items.len(), "pulls page");

        for raw in &listing.items {
          let Some(created_at) = raw.fetch("created_at").to_datetime() else {
            warn!(repo = %repo, number = ?raw.fetch("number").to::<u64>(), "skipping PR without a parseable created_at");
            continue;
          };

          // Newest-created first: nothing older can be followed by something in range.
          if created_at < window.since {
            break 'pages;
          }
          if !window.contains(created_at) {
            continue;
          }

          let detail = match raw.fetch("number").to::<u64>() {
            Some(number) if self.options.line_stats => {
              self.check_cancel()?;
              Some(self.api.get_pull(repo, number)?)
            }
            _ => None,
          };

          match pull_request_from_json(raw, detail.as_ref()) {
            Some(pr) => out.push(pr),
            None => warn!(repo = %repo, "skipping PR record without a number"),
          }
        }

        if !listing.has_next {
          break;
        }
        page += 1;
      }
    }

    Ok(out)
  }

  pub fn fetch_commits(&self, repo: &RepoId, window: &Window) -> Result<Vec<Commit>, ApiError> {
    let mut out = Vec::new();
    let mut page = 1;

    loop {
      self.check_cancel()?;
      let listing = self.api.list_commits(repo, window.since, window.until, page)?;
      debug!(repo = %repo, page, items = listing.items.len(), "commits page");

      for raw in &listing.items {
        if is_merge_commit(raw) {
          continue;
        }

        let detail = match raw.fetch("sha").to::<String>() {
          Some(sha) if self.options.line_stats => {
            self.check_cancel()?;
            Some(self.api.get_commit(repo, &sha)?)
          }
          _ => None,
        };

        match commit_from_json(raw, detail.as_ref()) {
          Some(c) => out.push(c),
          None => warn!(repo = %repo, sha = ?raw.fetch("sha").to::<String>(), "skipping commit without sha or parseable date"),
        }
      }

      if !listing.has_next {
        break;
      }
      page += 1;
    }

    Ok(out)
  }

  pub fn fetch_open_issues(&self, repo: &RepoId) -> Result<Vec<Issue>, ApiError> {
    let mut out = Vec::new();
    let mut page = 1;

    loop {
      self.check_cancel()?;
      let listing = self.api.list_open_issues(repo, page)?;
      debug!(repo = %repo, page, items = listing.items.len(), "issues page");

      for raw in listing.items.iter().filter(|i| !is_pull_request_issue(i)) {
        match issue_from_json(raw) {
          Some(issue) => out.push(issue),
          None => warn!(repo = %repo, number = ?raw.fetch("number").to::<u64>(), "skipping issue without number or parseable created_at"),
        }
      }

      if !listing.has_next {
        break;
      }
      page += 1;
    }

    Ok(out)
  }
}

// --- Record normalizers (pure) ---

fn author_or_unknown(v: &Value, path: &str) -> String {
  v.fetch(path)
    .to::<String>()
    .filter(|s| !s.trim().is_empty())
    .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

pub fn is_merge_commit(raw: &Value) -> bool {
  raw.fetch("parents").as_array().is_some_and(|p| p.len() > 1)
}

pub fn is_pull_request_issue(raw: &Value) -> bool {
  raw.fetch("pull_request").is_present()
}

/// Build a PullRequest from a listing record, preferring `detail` for merge state and change sizes.
pub fn pull_request_from_json(raw: &Value, detail: Option<&Value>) -> Option<PullRequest> {
  let number = raw.fetch("number").to::<u64>()?;
  let created_at = raw.fetch("created_at").to_datetime()?;
  let rich = detail.unwrap_or(raw);

  let merged_at = rich
    .fetch("merged_at")
    .to_datetime()
    .or_else(|| raw.fetch("merged_at").to_datetime());
  let merged_flag = rich.fetch("merged").to::<bool>().unwrap_or(false);

  let state = if merged_flag || merged_at.is_some() {
    PrState::Merged
  } else if raw.fetch("state").to::<String>().as_deref() == Some("closed") {
    PrState::Closed
  } else {
    PrState::Open
  };

  Some(PullRequest {
    number,
    title: raw.fetch("title").to_or_default(),
    state,
    author: author_or_unknown(raw, "user.login"),
    created_at,
    merged_at,
    closed_at: raw.fetch("closed_at").to_datetime(),
    url: raw.fetch("html_url").to_or_default(),
    additions: rich.fetch("additions").to_or_default(),
    deletions: rich.fetch("deletions").to_or_default(),
    changed_files: rich.fetch("changed_files").to_or_default(),
  })
}

/// Build a Commit from a listing record; line counts come from `detail.stats` when given.
pub fn commit_from_json(raw: &Value, detail: Option<&Value>) -> Option<Commit> {
  let sha = raw.fetch("sha").to::<String>()?;
  let date = raw
    .fetch("commit.author.date")
    .to_datetime()
    .or_else(|| raw.fetch("commit.committer.date").to_datetime())?;
  let stats = detail.unwrap_or(raw);

  Some(Commit {
    sha,
    message: raw.fetch("commit.message").to_or_default(),
    author: author_or_unknown(raw, "commit.author.name"),
    author_email: raw.fetch("commit.author.email").to_or_default(),
    date,
    url: raw.fetch("html_url").to_or_default(),
    additions: stats.fetch("stats.additions").to_or_default(),
    deletions: stats.fetch("stats.deletions").to_or_default(),
  })
}

fn names(raw: &Value, list: &str, field: &str) -> Vec<String> {
  raw
    .fetch(list)
    .as_array()
    .map(|items| items.iter().filter_map(|i| i.fetch(field).to::<String>()).collect())
    .unwrap_or_default()
}

pub fn issue_from_json(raw: &Value) -> Option<Issue> {
  let state = match raw.fetch("state").to::<String>().as_deref() {
    Some("closed") => IssueState::Closed,
    _ => IssueState::Open,
  };

  Some(Issue {
    number: raw.fetch("number").to::<u64>()?,
    title: raw.fetch("title").to_or_default(),
    state,
    author: author_or_unknown(raw, "user.login"),
    created_at: raw.fetch("created_at").to_datetime()?,
    closed_at: raw.fetch("closed_at").to_datetime(),
    url: raw.fetch("html_url").to_or_default(),
    labels: names(raw, "labels", "name"),
    assignees: names(raw, "assignees", "login"),
  })
}
