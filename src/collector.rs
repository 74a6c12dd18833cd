// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate the fetcher across configured repositories into one ActivityReport (fail-fast)
// role: collector/orchestration
// inputs: &dyn GithubApi, ordered Vec<RepoId>, CollectOptions, optional Window (default: trailing 7 days)
// outputs: ActivityReport in configuration order carrying the requested window bounds
// side_effects: Remote API calls via RepoFetcher; info/error logs per repository
// invariants:
// - Never returns a partial report: the first failing repository fails the whole collection
// - Sequential mode stops calling the API at the failing repository
// - Concurrent mode raises a shared cancel flag on first failure and reports only that failure
// - Output order equals configuration order regardless of completion order
// errors: CollectError::Repository (repo + ApiError source); CollectError::Window when the default window cannot be built; CollectError::WorkerPool when rayon cannot start
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info};

use crate::fetcher::{FetchOptions, RepoFetcher};
use crate::github::{ApiError, GithubApi, RepoId};
use crate::model::{ActivityReport, RepositoryActivity};
use crate::window::{Window, DEFAULT_DAYS};

#[derive(Error, Debug)]
pub enum CollectError {
  #[error("failed to collect activity for {repo}")]
  Repository {
    repo: String,
    #[source]
    source: ApiError,
  },
  #[error("invalid collection window: {0}")]
  Window(String),
  #[error("could not start the worker pool")]
  WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
  pub fetch: FetchOptions,
  /// Repositories fetched at once; 1 means strictly sequential.
  pub concurrency: usize,
}

impl Default for CollectOptions {
  fn default() -> Self {
    Self {
      fetch: FetchOptions::default(),
      concurrency: 1,
    }
  }
}

pub struct Collector<'a> {
  api: &'a dyn GithubApi,
  repos: Vec<RepoId>,
  options: CollectOptions,
}

impl<'a> Collector<'a> {
  pub fn new(api: &'a dyn GithubApi, repos: Vec<RepoId>, options: CollectOptions) -> Self {
    Self { api, repos, options }
  }

  pub fn collect(&self, window: Option<Window>) -> Result<ActivityReport, CollectError> {
    self.collect_at(window, Utc::now())
  }

  /// Collect with an explicit "now" (default window anchor and `collected_at` stamp).
  pub fn collect_at(&self, window: Option<Window>, now: DateTime<Utc>) -> Result<ActivityReport, CollectError> {
    let window = match window {
      Some(w) => w,
      None => Window::trailing_days(now, DEFAULT_DAYS).map_err(|e| CollectError::Window(format!("{:#}", e)))?,
    };

    info!(
      repos = self.repos.len(),
      since = %window.since.to_rfc3339(),
      until = %window.until.to_rfc3339(),
      "collecting GitHub activity"
    );

    let repositories = if self.options.concurrency > 1 && self.repos.len() > 1 {
      self.collect_concurrent(&window, now)?
    } else {
      self.collect_sequential(&window, now)?
    };

    let report = ActivityReport {
      repositories,
      date_range_start: Some(window.since),
      date_range_end: Some(window.until),
    };

    info!(
      repos = report.total_repos(),
      prs = report.total_prs(),
      commits = report.total_commits(),
      open_issues = report.total_open_issues(),
      "collection complete"
    );

    Ok(report)
  }

  fn collect_sequential(&self, window: &Window, now: DateTime<Utc>) -> Result<Vec<RepositoryActivity>, CollectError> {
    let fetcher = RepoFetcher::new(self.api, self.options.fetch);

    // Lazy iterator + collect short-circuits at the first Err.
    self
      .repos
      .iter()
      .map(|repo| {
        fetcher
          .fetch_at(repo, window, now)
          .map(log_collected)
          .map_err(|source| repository_error(repo, source))
      })
      .collect()
  }

  fn collect_concurrent(&self, window: &Window, now: DateTime<Utc>) -> Result<Vec<RepositoryActivity>, CollectError> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(self.options.concurrency)
      .build()?;

    let cancel = AtomicBool::new(false);
    let first_error: Mutex<Option<CollectError>> = Mutex::new(None);
    let fetcher = RepoFetcher::new(self.api, self.options.fetch).with_cancel(&cancel);

    let results: Vec<Result<RepositoryActivity, ApiError>> = pool.install(|| {
      self
        .repos
        .par_iter()
        .map(|repo| {
          let outcome = fetcher.fetch_at(repo, window, now);

          match &outcome {
            Ok(_) | Err(ApiError::Cancelled) => {}
            Err(source) => {
              cancel.store(true, Ordering::SeqCst);

              if let Ok(mut slot) = first_error.lock() {
                if slot.is_none() {
                  *slot = Some(repository_error(repo, source.clone()));
                }
              }
            }
          }

          outcome
        })
        .collect()
    });

    if let Some(err) = first_error.into_inner().ok().flatten() {
      return Err(err);
    }

    // Indexed collect keeps configuration order.
    results
      .into_iter()
      .zip(&self.repos)
      .map(|(outcome, repo)| outcome.map(log_collected).map_err(|source| repository_error(repo, source)))
      .collect()
  }
}

fn repository_error(repo: &RepoId, source: ApiError) -> CollectError {
  error!(repo = %repo, error = %source, "repository fetch failed");

  CollectError::Repository {
    repo: repo.full_name(),
    source,
  }
}

fn log_collected(activity: RepositoryActivity) -> RepositoryActivity {
  info!(
    repo = %activity.repo_name,
    prs = activity.total_prs(),
    commits = activity.total_commits(),
    open_issues = activity.total_open_issues(),
    "collected repository"
  );

  activity
}
