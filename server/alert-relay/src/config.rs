//! Relay configuration read from the environment, with sane defaults.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RelayError;

/// Maximum accepted size of a `POST /alert` body.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_KEEPALIVE_SECS: u64 = 15;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

impl LogFormat {
  fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "text" | "plain" | "" => Some(Self::Text),
      "json" => Some(Self::Json),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  /// Listen port; the relay always binds on all interfaces.
  pub port: u16,
  /// Directory holding `index.html` and any other UI assets.
  pub static_dir: PathBuf,
  /// Interval between keep-alive comments on idle push streams.
  pub keep_alive: Duration,
  pub log_format: LogFormat,
  /// Max `POST /alert` body size in bytes.
  pub body_limit: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      static_dir: default_static_dir(),
      keep_alive: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
      log_format: LogFormat::Text,
      body_limit: BODY_LIMIT_BYTES,
    }
  }
}

impl Config {
  /// Read `PORT`, `STATIC_DIR`, `SSE_KEEPALIVE_SECS` and `LOG_FORMAT`.
  /// A blank `PORT` counts as unset.
  pub fn from_env() -> Result<Self, RelayError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build a config from an arbitrary key lookup. Unset keys keep their defaults.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let mut config = Self::default();

    if let Some(raw) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
      config.port = raw
        .trim()
        .parse()
        .map_err(|_| RelayError::config("PORT", &format!("not a valid port: {:?}", raw)))?;
    }

    if let Some(dir) = lookup("STATIC_DIR").filter(|d| !d.trim().is_empty()) {
      config.static_dir = PathBuf::from(dir);
    }

    if let Some(raw) = lookup("SSE_KEEPALIVE_SECS") {
      let secs: u64 = raw.trim().parse().map_err(|_| {
        RelayError::config("SSE_KEEPALIVE_SECS", &format!("not a number: {:?}", raw))
      })?;
      if secs == 0 {
        return Err(RelayError::config("SSE_KEEPALIVE_SECS", "must be greater than zero"));
      }
      config.keep_alive = Duration::from_secs(secs);
    }

    if let Some(raw) = lookup("LOG_FORMAT") {
      config.log_format = LogFormat::parse(&raw)
        .ok_or_else(|| RelayError::config("LOG_FORMAT", "expected text|json"))?;
    }

    Ok(config)
  }

  pub fn listen_addr(&self) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
  }
}

fn default_static_dir() -> PathBuf {
  PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
}
