// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Reduce an ActivityReport to the one-line and per-repo digests used in the weekly email
// role: summary/formatting
// inputs: &ActivityReport
// outputs: Plain strings; no trailing newline
// invariants:
// - Pure functions; singular/plural wording is part of the output contract
// - Zero-valued clauses are omitted; the repo clause only appears for more than one repository
// - No merged PRs and no commits means "No activity tracked", whatever the repository count
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::model::ActivityReport;

const NO_ACTIVITY: &str = "Week's Coding: No activity tracked";
const DETAILED_HEADER: &str = "📊 Week's Coding Activity:";

fn noun(n: usize, word: &str) -> String {
  if n == 1 {
    word.to_string()
  } else {
    format!("{}s", word)
  }
}

fn plural(n: usize, word: &str) -> String {
  format!("{} {}", n, noun(n, word))
}

/// `Week's Coding: 3 PRs merged, 12 commits, across 2 repos`
pub fn format_weekly_summary(report: &ActivityReport) -> String {
  let merged = report.total_merged_prs();
  let commits = report.total_commits();
  let repos = report.total_repos();

  if merged == 0 && commits == 0 {
    return NO_ACTIVITY.to_string();
  }

  let mut parts = Vec::new();

  if merged > 0 {
    parts.push(format!("{} merged", plural(merged, "PR")));
  }
  if commits > 0 {
    parts.push(plural(commits, "commit"));
  }
  if repos > 1 {
    parts.push(format!("across {} repos", repos));
  }

  format!("Week's Coding: {}", parts.join(", "))
}

/// Header line, one bullet per repository with activity, then the contributor count.
pub fn format_detailed_summary(report: &ActivityReport) -> String {
  let mut lines = vec![DETAILED_HEADER.to_string()];

  for repo in &report.repositories {
    let mut stats = Vec::new();

    if repo.merged_prs() > 0 {
      stats.push(format!("{} merged", plural(repo.merged_prs(), "PR")));
    }
    if repo.total_commits() > 0 {
      stats.push(plural(repo.total_commits(), "commit"));
    }
    if repo.total_open_issues() > 0 {
      stats.push(format!("{} open {}", repo.total_open_issues(), noun(repo.total_open_issues(), "issue")));
    }

    if !stats.is_empty() {
      lines.push(format!("  • {}: {}", repo.repo_name, stats.join(", ")));
    }
  }

  let contributors = report.unique_contributors().len();
  if contributors > 0 {
    lines.push(format!("  • {}", plural(contributors, "contributor")));
  }

  lines.join("\n")
}

/// Per-repository counts as an aligned plain-text table with a TOTAL row.
pub fn format_table(report: &ActivityReport) -> String {
  const COLUMNS: [&str; 5] = ["PRs", "Merged", "Commits", "Open Issues", "Contributors"];

  let name_width = report
    .repositories
    .iter()
    .map(|r| r.repo_name.chars().count())
    .chain(["Repository".len(), "TOTAL".len()])
    .max()
    .unwrap_or(0);

  let row = |name: &str, cells: [String; 5]| {
    let mut line = format!("{:<width$}", name, width = name_width);
    for (cell, header) in cells.iter().zip(COLUMNS) {
      line.push_str(&format!("  {:>width$}", cell, width = header.len()));
    }
    line.trim_end().to_string()
  };

  let mut lines = vec![row("Repository", COLUMNS.map(str::to_string))];

  for repo in &report.repositories {
    lines.push(row(
      &repo.repo_name,
      [
        repo.total_prs().to_string(),
        repo.merged_prs().to_string(),
        repo.total_commits().to_string(),
        repo.total_open_issues().to_string(),
        repo.unique_contributors().len().to_string(),
      ],
    ));
  }

  lines.push(row(
    "TOTAL",
    [
      report.total_prs().to_string(),
      report.total_merged_prs().to_string(),
      report.total_commits().to_string(),
      report.total_open_issues().to_string(),
      report.unique_contributors().len().to_string(),
    ],
  ));

  lines.join("\n")
}
