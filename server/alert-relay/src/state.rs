//! Shared application state handed to every handler.

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::enrich::Enricher;

pub struct AppState {
  pub config: Config,
  pub broadcaster: Broadcaster,
  pub enricher: Enricher,
}

impl AppState {
  pub fn new(config: Config) -> Self {
    Self {
      config,
      broadcaster: Broadcaster::new(),
      enricher: Enricher::new(),
    }
  }
}
