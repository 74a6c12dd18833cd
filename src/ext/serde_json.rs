// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path access into raw GitHub JSON records with typed, non-panicking extraction
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper (typed extraction, presence checks, RFC3339 timestamps)
// invariants: No panics; missing paths and JSON null both read as absent; to_or_default returns T::default on failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

/// A located (or missing) JSON value, read in a second typed step.
pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self
      .value()
      .and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Deserialize as `T`, returning `T::default()` on failure.
  pub fn to_or_default<T>(&self) -> T
  where
    T: DeserializeOwned + Default,
  {
    self.to::<T>().unwrap_or_default()
  }

  /// True when the path exists and is not JSON `null`.
  ///
  /// GitHub marks issue-shaped pull requests with a `pull_request` object; an explicit
  /// `null` there means "not a PR", so plain key presence is not enough.
  pub fn is_present(&self) -> bool {
    self.value().is_some()
  }

  /// Parse an RFC3339 string (e.g. `2025-08-12T14:03:00Z`) into UTC.
  pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
    let raw = self.value()?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc))
  }

  /// Borrow the elements when the value is an array.
  pub fn as_array(&self) -> Option<&'a Vec<serde_json::Value>> {
    self.value().and_then(|v| v.as_array())
  }

  fn value(&self) -> Option<&'a serde_json::Value> {
    self.inner.filter(|v| !v.is_null())
  }
}

/// Extension to fetch nested values via dotted paths like "commit.author.name".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      match cur.get(key) {
        Some(next) => cur = next,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
