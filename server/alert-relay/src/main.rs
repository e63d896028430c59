//! Binary entrypoint for the alert relay.

use std::sync::Arc;
use tokio::net::TcpListener;

use alert_relay::{init_logging, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = Config::from_env()?;
  init_logging(config.log_format);

  let addr = config.listen_addr();
  let static_dir = config.static_dir.clone();
  let state = Arc::new(AppState::new(config));

  let listener = TcpListener::bind(addr).await?;
  tracing::info!(static_dir = %static_dir.display(), "alert-relay listening on http://{}", addr);

  alert_relay::serve(listener, state, alert_relay::shutdown_signal()).await?;

  tracing::info!("alert-relay stopped");
  Ok(())
}
