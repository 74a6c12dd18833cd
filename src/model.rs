// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the normalized activity model (PRs, commits, issues, per-repo rollups, multi-repo report)
// role: model/types
// outputs: Serializable structs with stable field names; derived aggregates exposed as accessor methods
// invariants:
// - Derived counts/contributor sets are computed on demand, never stored
// - is_merged is true when state is merged OR merged_at is set
// - Optional fields serialize as explicit null; timestamps are RFC3339 UTC
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author placeholder for records the remote returns without a user.
pub const UNKNOWN_AUTHOR: &str = "unknown";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
  Open,
  Closed,
  Merged,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
  Open,
  Closed,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PullRequest {
  pub number: u64,
  pub title: String,
  pub state: PrState,
  pub author: String,
  pub created_at: DateTime<Utc>,
  pub merged_at: Option<DateTime<Utc>>,
  pub closed_at: Option<DateTime<Utc>>,
  pub url: String,
  pub additions: u64,
  pub deletions: u64,
  pub changed_files: u64,
}

impl PullRequest {
  pub fn is_merged(&self) -> bool {
    self.state == PrState::Merged || self.merged_at.is_some()
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Commit {
  pub sha: String,
  pub message: String,
  pub author: String,
  pub author_email: String,
  pub date: DateTime<Utc>,
  pub url: String,
  pub additions: u64,
  pub deletions: u64,
}

impl Commit {
  pub fn short_sha(&self) -> &str {
    self.sha.get(..7).unwrap_or(&self.sha)
  }

  /// First line of the commit message.
  pub fn short_message(&self) -> &str {
    self.message.lines().next().unwrap_or("")
  }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Issue {
  pub number: u64,
  pub title: String,
  pub state: IssueState,
  pub author: String,
  pub created_at: DateTime<Utc>,
  pub closed_at: Option<DateTime<Utc>>,
  pub url: String,
  pub labels: Vec<String>,
  pub assignees: Vec<String>,
}

impl Issue {
  pub fn is_open(&self) -> bool {
    self.state == IssueState::Open
  }
}

/// Activity for one repository inside one window.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RepositoryActivity {
  pub repo_name: String,
  pub collected_at: DateTime<Utc>,
  pub pull_requests: Vec<PullRequest>,
  pub commits: Vec<Commit>,
  pub open_issues: Vec<Issue>,
}

impl RepositoryActivity {
  pub fn total_prs(&self) -> usize {
    self.pull_requests.len()
  }

  pub fn merged_prs(&self) -> usize {
    self.pull_requests.iter().filter(|pr| pr.is_merged()).count()
  }

  pub fn total_commits(&self) -> usize {
    self.commits.len()
  }

  pub fn total_open_issues(&self) -> usize {
    self.open_issues.len()
  }

  /// Sorted union of PR author logins and commit author names.
  pub fn unique_contributors(&self) -> Vec<String> {
    self.contributor_set().into_iter().map(str::to_string).collect()
  }

  fn contributor_set(&self) -> BTreeSet<&str> {
    let prs = self.pull_requests.iter().map(|pr| pr.author.as_str());
    let commits = self.commits.iter().map(|c| c.author.as_str());
    prs.chain(commits).collect()
  }
}

/// Activity across every configured repository, in configuration order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ActivityReport {
  pub repositories: Vec<RepositoryActivity>,
  pub date_range_start: Option<DateTime<Utc>>,
  pub date_range_end: Option<DateTime<Utc>>,
}

impl ActivityReport {
  pub fn total_repos(&self) -> usize {
    self.repositories.len()
  }

  pub fn total_prs(&self) -> usize {
    self.repositories.iter().map(RepositoryActivity::total_prs).sum()
  }

  pub fn total_merged_prs(&self) -> usize {
    self.repositories.iter().map(RepositoryActivity::merged_prs).sum()
  }

  pub fn total_commits(&self) -> usize {
    self.repositories.iter().map(RepositoryActivity::total_commits).sum()
  }

  pub fn total_open_issues(&self) -> usize {
    self.repositories.iter().map(RepositoryActivity::total_open_issues).sum()
  }

  /// Distinct contributors across all repositories (union, not sum).
  pub fn unique_contributors(&self) -> Vec<String> {
    let all: BTreeSet<&str> = self
      .repositories
      .iter()
      .flat_map(|repo| repo.contributor_set())
      .collect();

    all.into_iter().map(str::to_string).collect()
  }
}
