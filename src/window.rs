// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve CLI window selections (--days, --month, --for, --since/--until) into a concrete UTC window
// role: window/resolution
// inputs: WindowSpec from cli::normalize; "now" (real or --now-override)
// outputs: Window { since, until } with inclusive bounds
// invariants:
// - since <= until for every Window produced here
// - Calendar ranges (month, last week, last month, natural ranges) end one second before the next period starts
// - Durations (e.g. "2 weeks ago", "10 days") always produce a trailing window ending at now
// errors: Invalid --month, unrecognized --for phrase, unparseable --since/--until, since after until
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_english::{parse_duration, Interval};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use two_timer::{parse as parse_natural, Config as NaturalConfig};

pub const DEFAULT_DAYS: u32 = 7;

/// Inclusive `[since, until]` range bounding which created-at records are collected.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Window {
  pub since: DateTime<Utc>,
  pub until: DateTime<Utc>,
}

impl Window {
  pub fn new(since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Self> {
    if since > until {
      bail!("window start {} is after window end {}", since.to_rfc3339(), until.to_rfc3339());
    }

    Ok(Self { since, until })
  }

  /// `[now - days, now]`; errors when the start falls outside the representable range.
  pub fn trailing_days(now: DateTime<Utc>, days: u32) -> Result<Self> {
    let since = back_from(now, Duration::try_days(i64::from(days)))
      .with_context(|| format!("{} days before {} is out of range", days, now.to_rfc3339()))?;

    Self::new(since, now)
  }

  pub fn contains(&self, t: DateTime<Utc>) -> bool {
    t >= self.since && t <= self.until
  }
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum WindowSpec {
  Days { days: u32 },
  Month { ym: String },
  ForPhrase { phrase: String },
  SinceUntil { since: String, until: String },
}

impl Default for WindowSpec {
  fn default() -> Self {
    WindowSpec::Days { days: DEFAULT_DAYS }
  }
}

/// Compute the concrete window for `spec` relative to `now`.
pub fn resolve_window(spec: &WindowSpec, now: DateTime<Utc>) -> Result<Window> {
  match spec {
    WindowSpec::Days { days } => Window::trailing_days(now, *days),
    WindowSpec::Month { ym } => month_bounds(ym),
    WindowSpec::ForPhrase { phrase } => for_phrase_bounds(phrase, now),
    WindowSpec::SinceUntil { since, until } => {
      let s = parse_bound(since, BoundSide::Since).with_context(|| format!("parsing --since {:?}", since))?;
      let u = parse_bound(until, BoundSide::Until).with_context(|| format!("parsing --until {:?}", until))?;
      Window::new(s, u)
    }
  }
}

pub fn month_bounds(year_month: &str) -> Result<Window> {
  let parts: Vec<&str> = year_month.split('-').collect();

  if parts.len() != 2 {
    bail!("invalid --month, expected YYYY-MM");
  }
  let y: i32 = parts[0].parse().context("parsing year in --month")?;
  let m: u32 = parts[1].parse().context("parsing month in --month")?;

  if !(1..=12).contains(&m) {
    bail!("invalid month in --month");
  }

  let start = month_start(y, m)?;
  let next = next_month_start(start)?;

  Window::new(start, next - Duration::seconds(1))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoundSide {
  Since,
  Until,
}

/// Parse a `--since`/`--until` value.
///
/// Accepts RFC3339, a naive `%Y-%m-%dT%H:%M:%S` (read as UTC), or a bare `YYYY-MM-DD`; a bare date
/// covers the whole day, so as an upper bound it means 23:59:59.
pub fn parse_bound(raw: &str, side: BoundSide) -> Result<DateTime<Utc>> {
  let raw = raw.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }

  if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
    return Ok(Utc.from_utc_datetime(&ndt));
  }

  let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .with_context(|| format!("expected RFC3339 or YYYY-MM-DD, got {:?}", raw))?;

  let start = day_start(date)?;

  Ok(match side {
    BoundSide::Since => start,
    BoundSide::Until => start + Duration::days(1) - Duration::seconds(1),
  })
}

/// Parse a `--now-override` string.
/// Accepts RFC3339 (e.g. 2025-08-15T12:00:00Z) or a naive `%Y-%m-%dT%H:%M:%S`, read as UTC.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Utc>> {
  s.and_then(|raw| {
    DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&Utc))
      .or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
          .ok()
          .map(|ndt| Utc.from_utc_datetime(&ndt))
      })
  })
}

// --- Helpers for `--for` parsing ---

fn day_start(date: NaiveDate) -> Result<DateTime<Utc>> {
  let ndt = date.and_hms_opt(0, 0, 0).context("midnight out of range")?;
  Ok(Utc.from_utc_datetime(&ndt))
}

fn month_start(y: i32, m: u32) -> Result<DateTime<Utc>> {
  let date = NaiveDate::from_ymd_opt(y, m, 1).with_context(|| format!("invalid month {y:04}-{m:02}"))?;
  day_start(date)
}

fn next_month_start(start: DateTime<Utc>) -> Result<DateTime<Utc>> {
  let (y, m) = (start.year(), start.month());
  let (ny, nm) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
  month_start(ny, nm)
}

fn start_of_week(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
  let weekday = now.weekday().num_days_from_monday() as i64;
  day_start((now - Duration::days(weekday)).date_naive())
}

fn last_week_range(now: DateTime<Utc>) -> Result<Window> {
  let start_this_week = start_of_week(now)?;
  let start_last_week = start_this_week - Duration::days(7);
  Window::new(start_last_week, start_this_week - Duration::seconds(1))
}

fn last_month_range(now: DateTime<Utc>) -> Result<Window> {
  let start_this = month_start(now.year(), now.month())?;
  let (y, m) = if now.month() == 1 {
    (now.year() - 1, 12)
  } else {
    (now.year(), now.month() - 1)
  };
  let start_last = month_start(y, m)?;
  Window::new(start_last, start_this - Duration::seconds(1))
}

fn weekday_index(day: &str) -> Option<i64> {
  let idx = match day {
    "monday" => 0,
    "tuesday" => 1,
    "wednesday" => 2,
    "thursday" => 3,
    "friday" => 4,
    "saturday" => 5,
    "sunday" => 6,
    _ => return None,
  };
  Some(idx)
}

/// Compute the window for a natural-language phrase.
fn for_phrase_bounds(input: &str, now: DateTime<Utc>) -> Result<Window> {
  static RE_LAST_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^last\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)$")
      .expect("static weekday regex")
  });

  let phrase = input.trim().to_lowercase();

  match phrase.as_str() {
    "today" => return Window::new(day_start(now.date_naive())?, now),
    // Trailing 24h rather than the previous calendar day.
    "yesterday" => return Window::new(now - Duration::days(1), now),
    "last week" => return last_week_range(now),
    "last month" => return last_month_range(now),
    _ => {}
  }

  // Strictly previous occurrence of the weekday, through now.
  if let Some(caps) = RE_LAST_WEEKDAY.captures(&phrase) {
    let target_idx = caps.get(1).and_then(|m| weekday_index(m.as_str())).unwrap_or(0);
    let today_start = day_start(now.date_naive())?;
    let cur_idx = today_start.weekday().num_days_from_monday() as i64;

    let mut delta_days = cur_idx - target_idx;
    if delta_days <= 0 {
      delta_days += 7;
    }

    return Window::new(today_start - Duration::days(delta_days), now);
  }

  // Durations via chrono-english, before the natural parser can misread them.
  if let Ok(interval) = parse_duration(&phrase) {
    let since = match interval {
      Interval::Seconds(secs) => back_from(now, Duration::try_seconds(i64::from(secs).abs())),
      Interval::Days(days) => back_from(now, Duration::try_days(i64::from(days).abs())),
      Interval::Months(months) => subtract_months(now, months.unsigned_abs()).ok(),
    }
    .with_context(|| format!("--for {:?} reaches outside the supported date range", input))?;

    return Window::new(since, now);
  }

  // Natural ranges via two_timer (last year, this week, june, ...). Its end is exclusive.
  let config = NaturalConfig::new().now(now.naive_utc());
  if let Ok((start_naive, end_naive, _)) = parse_natural(&phrase, Some(config)) {
    let start = Utc.from_utc_datetime(&start_naive);
    let end = Utc.from_utc_datetime(&end_naive) - Duration::seconds(1);
    let until = if end > now { now } else { end };

    return Window::new(start, until).with_context(|| format!("--for {:?} lies in the future", input));
  }

  bail!("unrecognized --for phrase: {:?}", input)
}

/// `now - span`, or None when either the span or the result is out of range.
fn back_from(now: DateTime<Utc>, span: Option<Duration>) -> Option<DateTime<Utc>> {
  span.and_then(|d| now.checked_sub_signed(d))
}

fn last_day_of_month(year: i32, month: u32) -> Result<u32> {
  let first = month_start(year, month)?;
  Ok((next_month_start(first)? - Duration::days(1)).day())
}

fn subtract_months(dt: DateTime<Utc>, n: u32) -> Result<DateTime<Utc>> {
  let total = (i64::from(dt.year()) * 12 + i64::from(dt.month()) - 1) - i64::from(n);
  let y = i32::try_from(total.div_euclid(12)).context("month arithmetic out of range")?;
  let m = (total.rem_euclid(12) + 1) as u32;
  let d = dt.day().min(last_day_of_month(y, m)?);

  let date = NaiveDate::from_ymd_opt(y, m, d).context("month arithmetic out of range")?;
  Ok(Utc.from_utc_datetime(&date.and_time(dt.time())))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn now() -> DateTime<Utc> {
    // Friday
    Utc.with_ymd_and_hms(2025, 8, 15, 12, 0, 0).unwrap()
  }

  fn resolve(spec: WindowSpec) -> Window {
    resolve_window(&spec, now()).unwrap()
  }

  fn phrase(p: &str) -> Result<Window> {
    resolve_window(&WindowSpec::ForPhrase { phrase: p.into() }, now())
  }

  #[test]
  fn default_is_trailing_seven_days() {
    let w = resolve(WindowSpec::default());
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 8, 8, 12, 0, 0).unwrap());
    assert_eq!(w.until, now());
  }

  #[test]
  fn contains_is_inclusive_on_both_ends() {
    let w = Window::trailing_days(now(), 7).unwrap();
    assert!(w.contains(w.since));
    assert!(w.contains(w.until));
    assert!(!w.contains(w.since - Duration::seconds(1)));
    assert!(!w.contains(w.until + Duration::seconds(1)));
  }

  #[test]
  fn huge_day_counts_error_instead_of_overflowing() {
    let err = resolve_window(&WindowSpec::Days { days: 4_000_000_000 }, now()).unwrap_err();
    assert!(err.to_string().contains("out of range"));
    assert!(Window::trailing_days(now(), u32::MAX).is_err());

    // the largest span chrono can still represent from 2025 succeeds
    let w = resolve(WindowSpec::Days { days: 36_500 });
    assert_eq!(w.until, now());
  }

  #[test]
  fn huge_for_durations_error_instead_of_overflowing() {
    assert!(phrase("2000000000 days").is_err());
    assert!(phrase("2000000000 months").is_err());
    assert!(subtract_months(now(), u32::MAX).is_err());
  }

  #[test]
  fn window_rejects_inverted_bounds() {
    assert!(Window::new(now(), now() - Duration::seconds(1)).is_err());
    assert!(Window::new(now(), now()).is_ok());
  }

  #[test]
  fn month_bounds_basic() {
    let w = month_bounds("2025-08").unwrap();
    assert_eq!(w.since.to_rfc3339(), "2025-08-01T00:00:00+00:00");
    assert_eq!(w.until.to_rfc3339(), "2025-08-31T23:59:59+00:00");

    let dec = month_bounds("2024-12").unwrap();
    assert_eq!(dec.until, Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());
  }

  #[test]
  fn month_bounds_invalid_errors() {
    assert!(month_bounds("2025-13").is_err());
    assert!(month_bounds("2025").is_err());
    assert!(month_bounds("abcd-01").is_err());
  }

  #[test]
  fn since_until_accepts_dates_and_rfc3339() {
    let w = resolve(WindowSpec::SinceUntil {
      since: "2025-08-01".into(),
      until: "2025-08-07".into(),
    });
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap());
    assert_eq!(w.until, Utc.with_ymd_and_hms(2025, 8, 7, 23, 59, 59).unwrap());

    let w = resolve(WindowSpec::SinceUntil {
      since: "2025-08-01T10:00:00+02:00".into(),
      until: "2025-08-02T00:00:00".into(),
    });
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 8, 1, 8, 0, 0).unwrap());
    assert_eq!(w.until, Utc.with_ymd_and_hms(2025, 8, 2, 0, 0, 0).unwrap());
  }

  #[test]
  fn since_after_until_errors() {
    let err = resolve_window(
      &WindowSpec::SinceUntil {
        since: "2025-08-10".into(),
        until: "2025-08-01".into(),
      },
      now(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("after"));

    assert!(resolve_window(
      &WindowSpec::SinceUntil {
        since: "last tuesday".into(),
        until: "2025-08-01".into(),
      },
      now(),
    )
    .is_err());
  }

  #[test]
  fn for_phrase_today_anchors_to_day_start_until_now() {
    let w = phrase("today").unwrap();
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 8, 15, 0, 0, 0).unwrap());
    assert_eq!(w.until, now());
  }

  #[test]
  fn for_phrase_last_week_is_previous_calendar_week() {
    let w = phrase("Last Week").unwrap();
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 8, 4, 0, 0, 0).unwrap());
    assert_eq!(w.until, Utc.with_ymd_and_hms(2025, 8, 10, 23, 59, 59).unwrap());
  }

  #[test]
  fn for_phrase_last_month_has_calendar_bounds() {
    let w = phrase("last month").unwrap();
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
    assert_eq!(w.until, Utc.with_ymd_and_hms(2025, 7, 31, 23, 59, 59).unwrap());

    let jan = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
    let w = resolve_window(&WindowSpec::ForPhrase { phrase: "last month".into() }, jan).unwrap();
    assert_eq!(w.since, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
  }

  #[test]
  fn for_phrase_last_weekday_is_strictly_previous() {
    // now is a Friday; "last friday" is a week back
    let w = phrase("last friday").unwrap();
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 8, 8, 0, 0, 0).unwrap());
    let w = phrase("last monday").unwrap();
    assert_eq!(w.since, Utc.with_ymd_and_hms(2025, 8, 11, 0, 0, 0).unwrap());
    assert_eq!(w.until, now());
  }

  #[test]
  fn for_phrase_durations_trail_now() {
    let w = phrase("10 minutes").unwrap();
    assert_eq!((w.until - w.since).num_minutes(), 10);
    assert_eq!(w.until, now());

    let w = phrase("2 weeks ago").unwrap();
    assert_eq!((w.until - w.since).num_days(), 14);
  }

  #[test]
  fn for_phrase_months_clamp_day_of_month() {
    let end_of_march = Utc.with_ymd_and_hms(2025, 3, 31, 8, 0, 0).unwrap();
    assert_eq!(
      subtract_months(end_of_march, 1).unwrap(),
      Utc.with_ymd_and_hms(2025, 2, 28, 8, 0, 0).unwrap()
    );
  }

  #[test]
  fn for_phrase_last_year_has_calendar_bounds() {
    let w = phrase("last year").unwrap();
    assert_eq!(w.since, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(w.until, Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());
  }

  #[test]
  fn for_phrase_unrecognized_errors() {
    let err = phrase("unparseable phrase 12345").unwrap_err();
    assert!(err.to_string().contains("unrecognized --for phrase"));
  }

  #[test]
  fn now_override_reads_rfc3339_and_naive() {
    assert_eq!(parse_now_override(Some("2025-08-15T12:00:00Z")), Some(now()));
    assert_eq!(parse_now_override(Some("2025-08-15T14:00:00+02:00")), Some(now()));
    assert_eq!(parse_now_override(Some("2025-08-15T12:00:00")), Some(now()));
    assert_eq!(parse_now_override(Some("soon")), None);
    assert_eq!(parse_now_override(None), None);
  }
}
