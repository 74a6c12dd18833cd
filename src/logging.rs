use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
const DEFAULT_DIRECTIVE: &str = "info";

/// Pick the filter directive: `RUST_LOG` wins, then `LOG_LEVEL` (case-insensitive), then `info`.
///
/// `LOG_LEVEL` also accepts the `WARNING`/`CRITICAL` spellings.
pub fn filter_directive(rust_log: Option<&str>, log_level: Option<&str>) -> String {
  let pick = |v: Option<&str>| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

  pick(rust_log)
    .or_else(|| pick(log_level).map(|l| level_alias(&l.to_lowercase()).to_string()))
    .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

fn level_alias(level: &str) -> &str {
  match level {
    "warning" => "warn",
    "critical" | "fatal" => "error",
    other => other,
  }
}

/// Install the global subscriber once; logs go to stderr so stdout stays machine-readable.
pub fn init_logging() {
  let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
  let log_level = std::env::var(LOG_LEVEL_ENV).ok();
  let directive = filter_directive(rust_log.as_deref(), log_level.as_deref());

  let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

  let _ = fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}
