use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

/// A GitHub repository identifier (`owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
  owner: String,
  name: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid repo format: {0}. Expected 'owner/repo'")]
pub struct RepoIdError(pub String);

impl RepoId {
  /// Accepts `owner/name` as well as GitHub https/ssh remote URLs.
  pub fn parse(raw: &str) -> Result<Self, RepoIdError> {
    static RE_SLUG: Lazy<Regex> = Lazy::new(|| {
      Regex::new(r"^(?:git@github\.com:|https?://github\.com/)?([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?/?$")
        .expect("static repo slug regex")
    });

    let trimmed = raw.trim();
    let caps = RE_SLUG
      .captures(trimmed)
      .ok_or_else(|| RepoIdError(trimmed.to_string()))?;

    Ok(Self {
      owner: caps[1].to_string(),
      name: caps[2].to_string(),
    })
  }

  /// Parse a comma-separated list, skipping blank entries.
  pub fn parse_list(raw: &str) -> Result<Vec<Self>, RepoIdError> {
    raw
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(Self::parse)
      .collect()
  }

  pub fn owner(&self) -> &str {
    &self.owner
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn full_name(&self) -> String {
    format!("{}/{}", self.owner, self.name)
  }
}

impl fmt::Display for RepoId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.name)
  }
}

impl FromStr for RepoId {
  type Err = RepoIdError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}
