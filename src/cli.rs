use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use crate::github::RepoId;
use crate::window::{self, BoundSide, WindowSpec};

#[derive(Parser, Debug)]
#[command(
    name = "weekly-activity",
    version,
    about = "Collect a week of GitHub activity (PRs, commits, open issues) and summarize it",
    long_about = None
)]
pub struct Cli {
  /// Repositories to collect, comma-separated (owner/name or GitHub URL)
  #[arg(long, env = "GITHUB_REPOS")]
  pub repos: Option<String>,

  /// Trailing window in days ending now (default: 7)
  #[arg(long)]
  pub days: Option<u32>,

  /// Calendar month, e.g. 2025-08
  #[arg(long)]
  pub month: Option<String>,

  /// Natural language window, e.g. "last week", "2 weeks ago", "last tuesday"
  #[arg(long = "for")]
  pub for_str: Option<String>,

  /// Window start (RFC3339 or YYYY-MM-DD); must be paired with --until
  #[arg(long, alias = "start")]
  pub since: Option<String>,

  /// Window end, inclusive (RFC3339 or YYYY-MM-DD); must be paired with --since
  #[arg(long, alias = "end")]
  pub until: Option<String>,

  /// What to print on stdout
  #[arg(long, value_enum, default_value_t = OutputFormat::Summary)]
  pub format: OutputFormat,

  /// Save the JSON report: a file path, or "auto" for $REPORT_OUTPUT_DIR/github_activity_YYYY-MM-DD.json
  #[arg(long)]
  pub out: Option<String>,

  /// Render a previously exported report instead of collecting
  #[arg(long)]
  pub from_file: Option<PathBuf>,

  /// Repositories fetched at once (1 = sequential)
  #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=64))]
  pub concurrency: u16,

  /// Skip per-PR/per-commit detail calls; line counts stay 0
  #[arg(long)]
  pub no_line_stats: bool,

  /// Global timeout for each HTTP request, in seconds
  #[arg(long, default_value_t = 30)]
  pub timeout_secs: u64,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant for window resolution (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
  /// One-line summary followed by the per-repo digest
  Summary,
  /// Per-repo digest only
  Detailed,
  /// Aligned per-repo counts with totals
  Table,
  /// The full report as pretty JSON
  Json,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum OutTarget {
  Auto,
  Path(PathBuf),
}

#[derive(Debug)]
pub struct EffectiveConfig {
  pub repos: Vec<RepoId>,
  pub window: WindowSpec,
  pub format: OutputFormat,
  pub out: Option<OutTarget>,
  pub from_file: Option<PathBuf>,
  pub concurrency: usize,
  pub line_stats: bool,
  pub timeout: Duration,
  pub now_override: Option<String>,
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  // Phase 1: window selection
  let window = match (cli.days, &cli.month, &cli.for_str, &cli.since, &cli.until) {
    (None, None, None, None, None) => WindowSpec::default(),
    (Some(0), None, None, None, None) => bail!("--days must be at least 1"),
    (Some(days), None, None, None, None) => WindowSpec::Days { days },
    (None, Some(ym), None, None, None) => WindowSpec::Month { ym: ym.clone() },
    (None, None, Some(p), None, None) => WindowSpec::ForPhrase { phrase: p.clone() },
    (None, None, None, Some(s), Some(u)) => {
      let since = window::parse_bound(s, BoundSide::Since).context("parsing --since")?;
      let until = window::parse_bound(u, BoundSide::Until).context("parsing --until")?;

      if since > until {
        bail!("--since ({}) is after --until ({})", s, u);
      }

      WindowSpec::SinceUntil {
        since: s.clone(),
        until: u.clone(),
      }
    }
    (None, None, None, Some(_), None) | (None, None, None, None, Some(_)) => {
      bail!("--since and --until must be given together")
    }
    _ => bail!("Ambiguous time selection: choose only one of --days | --month | --for | --since/--until"),
  };

  // Phase 2: repositories (blank list is valid and yields an empty report)
  let repos = match cli.repos.as_deref() {
    Some(raw) => RepoId::parse_list(raw)?,
    None => Vec::new(),
  };

  // Phase 3: output target
  let out = cli.out.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(|s| {
    if s.eq_ignore_ascii_case("auto") {
      OutTarget::Auto
    } else {
      OutTarget::Path(PathBuf::from(s))
    }
  });

  if cli.timeout_secs == 0 {
    bail!("--timeout-secs must be at least 1");
  }

  Ok(EffectiveConfig {
    repos,
    window,
    format: cli.format,
    out,
    from_file: cli.from_file,
    concurrency: usize::from(cli.concurrency),
    line_stats: !cli.no_line_stats,
    timeout: Duration::from_secs(cli.timeout_secs),
    now_override: cli.now_override,
  })
}
