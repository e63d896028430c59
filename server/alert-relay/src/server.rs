//! Listener and graceful shutdown.

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::error::RelayError;
use crate::routes;
use crate::state::AppState;

/// Serve the relay on `listener` until `shutdown` resolves.
///
/// On shutdown the broadcaster is closed first: open push streams end, so
/// the graceful drain does not wait on idle UI clients forever.
pub async fn serve<F>(
  listener: TcpListener,
  state: Arc<AppState>,
  shutdown: F,
) -> Result<(), RelayError>
where
  F: Future<Output = ()> + Send + 'static,
{
  let app = routes::router(Arc::clone(&state));
  let broadcaster = state.broadcaster.clone();

  axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      shutdown.await;
      tracing::info!("shutdown requested");
      broadcaster.shutdown();
    })
    .await?;

  Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
}
