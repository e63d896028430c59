//! Router assembly: endpoints, static UI and the middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::any::Any;
use std::path::Path;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeader;
use tower_http::trace::TraceLayer;

use crate::error::RelayError;
use crate::handlers;
use crate::state::AppState;

/// One day, as the UI assets have always been served.
const STATIC_CACHE_CONTROL: &str = "public, max-age=86400";

pub fn router(state: Arc<AppState>) -> Router {
  let static_files = static_service(&state.config.static_dir);

  let routes = Router::new()
    .route("/alert", post(handlers::ingest_alert))
    .route("/events", get(handlers::events))
    .route("/health", get(handlers::health))
    .fallback_service(static_files);
  with_middleware(routes, state)
}

/// Wrap `routes` in the relay's middleware stack, panic handling outermost.
fn with_middleware(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
  let body_limit = state.config.body_limit;

  routes
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .layer(CatchPanicLayer::custom(panic_response))
    .with_state(state)
}

/// `/` maps to `index.html`; everything else is looked up under `dir`.
fn static_service(dir: &Path) -> SetResponseHeader<ServeDir, HeaderValue> {
  SetResponseHeader::overriding(
    ServeDir::new(dir),
    header::CACHE_CONTROL,
    HeaderValue::from_static(STATIC_CACHE_CONTROL),
  )
}

/// A panicking request becomes a 500; the listener keeps serving.
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = err.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = err.downcast_ref::<&str>() {
    s.to_string()
  } else {
    "unknown panic payload".to_string()
  };
  RelayError::internal(format!("handler panicked: {}", detail)).into_response()
}
