//! Tracing subscriber setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;

const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. A second call is a no-op.
pub fn init(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
  let registry = tracing_subscriber::registry().with(filter);

  let result = match format {
    LogFormat::Text => registry.with(fmt::layer()).try_init(),
    LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
  };
  if result.is_err() {
    tracing::debug!("tracing subscriber already installed");
  }
}
