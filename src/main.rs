use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::warn;

mod cli;
mod collector;
mod export;
mod ext;
mod fetcher;
mod github;
mod logging;
mod model;
mod summary;
mod util;
mod window;

use crate::cli::{normalize, Cli, EffectiveConfig, OutTarget, OutputFormat};
use crate::collector::{CollectOptions, Collector};
use crate::fetcher::FetchOptions;
use crate::model::ActivityReport;

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  logging::init_logging();

  // Phase 1: normalize CLI
  let cfg = normalize(cli)?;
  let now = util::effective_now(window::parse_now_override(cfg.now_override.as_deref()));

  // Phase 2: load or collect
  let report = match &cfg.from_file {
    Some(path) => export::load_report(path)?,
    None => collect(&cfg, now)?,
  };

  // Phase 3: persist, then render
  if let Some(target) = &cfg.out {
    let path = match target {
      OutTarget::Auto => export::default_export_path(now),
      OutTarget::Path(p) => p.clone(),
    };
    export::save_report(&report, &path)?;
  }

  let rendered = render(&report, cfg.format)?;
  let mut stdout = std::io::stdout().lock();
  writeln!(stdout, "{}", rendered).context("writing to stdout")?;

  Ok(())
}

fn collect(cfg: &EffectiveConfig, now: DateTime<Utc>) -> Result<ActivityReport> {
  let window = window::resolve_window(&cfg.window, now)?;

  if cfg.repos.is_empty() {
    warn!("no repositories configured; set --repos or GITHUB_REPOS");
  }

  let api = github::build_api(github::get_github_token(), cfg.timeout)?;
  let options = CollectOptions {
    fetch: FetchOptions {
      line_stats: cfg.line_stats,
    },
    concurrency: cfg.concurrency,
  };

  Collector::new(api.as_ref(), cfg.repos.clone(), options)
    .collect_at(Some(window), now)
    .context("collection failed")
}

fn render(report: &ActivityReport, format: OutputFormat) -> Result<String> {
  Ok(match format {
    OutputFormat::Summary => format!(
      "{}\n\n{}",
      summary::format_weekly_summary(report),
      summary::format_detailed_summary(report)
    ),
    OutputFormat::Detailed => summary::format_detailed_summary(report),
    OutputFormat::Table => summary::format_table(report),
    OutputFormat::Json => export::to_json_string(report)?,
  })
}
