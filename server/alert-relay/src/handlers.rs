//! HTTP handlers for the relay.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::{Stream, StreamExt};
use std::sync::Arc;

use crate::error::RelayError;
use crate::state::AppState;
use crate::types::{Alert, PushEvent, Received, NEW_ALERT_EVENT};

pub async fn health() -> &'static str {
  "ok"
}

/// `POST /alert`: validate, enrich, broadcast, acknowledge.
pub async fn ingest_alert(
  State(state): State<Arc<AppState>>,
  body: Bytes,
) -> Result<Json<Received>, RelayError> {
  let alert = Alert::from_slice(&body)?;
  let severity = alert.severity_label();

  let enriched = state.enricher.enrich(alert);
  tracing::info!(id = %enriched.id, "[ALERT] {}: {}", severity, enriched.rule);

  let payload = enriched.to_value()?;
  let delivery = state.broadcaster.broadcast(NEW_ALERT_EVENT, payload);
  tracing::debug!(
    id = %enriched.id,
    delivered = delivery.delivered,
    dropped = delivery.dropped,
    "alert broadcast"
  );

  Ok(Json(Received::new(enriched.id)))
}

/// `GET /events`: the push channel. One SSE stream per UI client; the
/// subscription is released when the client goes away and the stream drops.
pub async fn events(
  State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
  let subscription = state.broadcaster.register();
  tracing::info!(subscriber = %subscription.id(), "UI client connected");

  let stream = subscription.map(|push| to_sse(&push));
  Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config.keep_alive))
}

fn to_sse(push: &PushEvent) -> Result<Event, axum::Error> {
  Event::default().event(push.event).json_data(&*push.payload)
}
