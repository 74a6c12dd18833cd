use predicates::prelude::*;
use test_support::weekly_cmd;

const WEEK: &str = "github_week.json";

fn json_report(args: &[&str]) -> serde_json::Value {
  let out = weekly_cmd(WEEK)
    .args(["--format", "json"])
    .args(args)
    .output()
    .unwrap();
  assert!(
    out.status.success(),
    "command failed: {}",
    String::from_utf8_lossy(&out.stderr)
  );
  serde_json::from_slice(&out.stdout).unwrap()
}

fn range(v: &serde_json::Value) -> (&str, &str) {
  (
    v["date_range_start"].as_str().unwrap(),
    v["date_range_end"].as_str().unwrap(),
  )
}

#[test]
fn ambiguous_flags_error() {
  weekly_cmd(WEEK)
    .args(["--days", "3", "--for", "last week"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Ambiguous time selection"));
}

#[test]
fn since_after_until_errors() {
  weekly_cmd(WEEK)
    .args(["--since", "2025-08-10", "--until", "2025-08-01"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("is after --until"));
}

#[test]
fn since_without_until_errors() {
  weekly_cmd(WEEK)
    .args(["--since", "2025-08-10"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("must be given together"));
}

#[test]
fn zero_days_errors() {
  weekly_cmd(WEEK)
    .args(["--days", "0"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--days must be at least 1"));
}

#[test]
fn out_of_range_days_error_cleanly() {
  weekly_cmd(WEEK)
    .args(["--days", "4000000000", "--repos", "acme/api"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("out of range").and(predicate::str::contains("panicked").not()));
}

#[test]
fn days_window_trails_now() {
  let v = json_report(&["--days", "2"]);
  assert_eq!(range(&v), ("2025-08-13T12:00:00Z", "2025-08-15T12:00:00Z"));
}

#[test]
fn month_window_spans_the_calendar_month() {
  let v = json_report(&["--month", "2025-08", "--repos", "acme/api"]);
  assert_eq!(range(&v), ("2025-08-01T00:00:00Z", "2025-08-31T23:59:59Z"));

  // #39 (Aug 1) is inside the month; #43 (after now) is too
  let numbers: Vec<u64> = v["repositories"][0]["pull_requests"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["number"].as_u64().unwrap())
    .collect();
  assert_eq!(numbers, vec![43, 41, 42, 40, 39]);
}

#[test]
fn for_last_week_uses_previous_calendar_week() {
  let v = json_report(&["--for", "last week", "--repos", "acme/api,acme/web"]);
  assert_eq!(range(&v), ("2025-08-04T00:00:00Z", "2025-08-10T23:59:59Z"));

  let api = &v["repositories"][0];
  assert_eq!(api["pull_requests"].as_array().unwrap().len(), 1);
  assert_eq!(api["pull_requests"][0]["number"], 40);
  assert!(api["commits"].as_array().unwrap().is_empty());

  let web = &v["repositories"][1];
  assert_eq!(web["pull_requests"][0]["number"], 7);
  assert_eq!(web["commits"].as_array().unwrap().len(), 1);
}

#[test]
fn since_until_dates_are_inclusive_days() {
  let v = json_report(&["--since", "2025-08-12", "--until", "2025-08-12", "--repos", "acme/api"]);
  assert_eq!(range(&v), ("2025-08-12T00:00:00Z", "2025-08-12T23:59:59Z"));
  assert_eq!(v["repositories"][0]["commits"].as_array().unwrap().len(), 1);
}

#[test]
fn unrecognized_for_phrase_errors() {
  weekly_cmd(WEEK)
    .args(["--for", "whenever the moon is full"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unrecognized --for phrase"));
}

#[test]
fn gen_man_prints_troff() {
  test_support::cmd_bin(test_support::BIN)
    .arg("--gen-man")
    .assert()
    .success()
    .stdout(predicate::str::contains(".TH").and(predicate::str::contains("weekly-activity")));
}
