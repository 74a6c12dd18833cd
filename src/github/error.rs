use thiserror::Error;

/// Failure talking to the remote activity source.
///
/// Every variant aborts the repository fetch that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
  #[error("authorization failed (HTTP {status}): {message}")]
  Unauthorized { status: u16, message: String },
  #[error("rate limit exhausted (resets at epoch {})", fmt_reset(.reset_at))]
  RateLimited { reset_at: Option<i64> },
  #[error("not found: {message}")]
  NotFound { message: String },
  #[error("remote error (HTTP {status}): {message}")]
  Status { status: u16, message: String },
  #[error("transport error: {0}")]
  Transport(String),
  #[error("malformed response: {0}")]
  Decode(String),
  #[error("cancelled after another repository failed")]
  Cancelled,
}

fn fmt_reset(reset_at: &Option<i64>) -> String {
  reset_at.map(|r| r.to_string()).unwrap_or_else(|| "unknown".into())
}

impl ApiError {
  /// Classify a non-success HTTP status.
  ///
  /// `ratelimit_remaining` / `ratelimit_reset` come from the `x-ratelimit-*` headers when present.
  pub fn from_status(
    status: u16,
    message: String,
    ratelimit_remaining: Option<u64>,
    ratelimit_reset: Option<i64>,
  ) -> Self {
    match status {
      403 | 429 if ratelimit_remaining == Some(0) || status == 429 => ApiError::RateLimited {
        reset_at: ratelimit_reset,
      },
      401 | 403 => ApiError::Unauthorized { status, message },
      404 => ApiError::NotFound { message },
      _ => ApiError::Status { status, message },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_classification() {
    assert_eq!(
      ApiError::from_status(401, "Bad credentials".into(), None, None),
      ApiError::Unauthorized {
        status: 401,
        message: "Bad credentials".into()
      }
    );
    assert_eq!(
      ApiError::from_status(403, "rate".into(), Some(0), Some(1_755_000_000)),
      ApiError::RateLimited {
        reset_at: Some(1_755_000_000)
      }
    );
    assert!(matches!(
      ApiError::from_status(403, "forbidden".into(), Some(12), None),
      ApiError::Unauthorized { status: 403, .. }
    ));
    assert!(matches!(
      ApiError::from_status(429, "slow down".into(), None, None),
      ApiError::RateLimited { reset_at: None }
    ));
    assert!(matches!(
      ApiError::from_status(404, "Not Found".into(), None, None),
      ApiError::NotFound { .. }
    ));
    assert!(matches!(
      ApiError::from_status(502, "Bad Gateway".into(), None, None),
      ApiError::Status { status: 502, .. }
    ));
  }

  #[test]
  fn rate_limit_message_mentions_reset() {
    let e = ApiError::RateLimited { reset_at: Some(42) };
    assert_eq!(e.to_string(), "rate limit exhausted (resets at epoch 42)");
    let e = ApiError::RateLimited { reset_at: None };
    assert_eq!(e.to_string(), "rate limit exhausted (resets at epoch unknown)");
  }
}
