//! Wire types for the relay (JSON contracts + push events).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::RelayError;

/// Push channel event name for every accepted alert.
pub const NEW_ALERT_EVENT: &str = "new_alert";

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what publishers send)
// ---------------------------------------------------------------------------

/// One inbound alert. Open record: `rule` is the only required key, every
/// other key (including `severity`) is kept in `fields` and passed through.
#[derive(Debug, Clone, Deserialize)]
pub struct Alert {
  pub rule: String,
  /// Publisher-supplied timestamp, opaque. `null` counts as absent.
  #[serde(default)]
  pub ts: Option<Value>,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

impl Alert {
  /// Parse and validate a raw request body.
  ///
  /// The body goes through a `Value` first so a repeated key keeps its last
  /// value instead of failing as a duplicate field.
  pub fn from_slice(body: &[u8]) -> Result<Self, RelayError> {
    let object = match serde_json::from_slice::<Value>(body) {
      Ok(Value::Object(object)) => object,
      Ok(_) => {
        tracing::debug!("alert body rejected: not a JSON object");
        return Err(RelayError::InvalidAlert);
      }
      Err(e) => {
        tracing::debug!(error = %e, "alert body rejected");
        return Err(RelayError::InvalidAlert);
      }
    };
    let alert: Alert = serde_json::from_value(Value::Object(object)).map_err(|e| {
      tracing::debug!(error = %e, "alert body rejected");
      RelayError::InvalidAlert
    })?;
    if alert.rule.is_empty() {
      tracing::debug!("alert body rejected: empty rule");
      return Err(RelayError::InvalidAlert);
    }
    Ok(alert)
  }

  /// Severity as a log label; non-string values are rendered as JSON.
  pub fn severity_label(&self) -> String {
    match self.fields.get("severity") {
      Some(Value::String(s)) => s.clone(),
      Some(other) => other.to_string(),
      None => "unknown".to_string(),
    }
  }
}

// ---------------------------------------------------------------------------
// Enriched alert (what subscribers receive)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedAlert {
  pub id: String,
  pub ts: Value,
  pub rule: String,
  #[serde(flatten)]
  pub fields: Map<String, Value>,
}

impl EnrichedAlert {
  pub fn to_value(&self) -> Result<Value, RelayError> {
    serde_json::to_value(self).map_err(|e| RelayError::internal(format!("serialize alert: {}", e)))
  }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Received {
  pub status: String,
  pub id: String,
}

impl Received {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      status: "received".to_string(),
      id: id.into(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
  pub error: String,
}

impl ErrorBody {
  pub fn new(error: impl Into<String>) -> Self {
    Self { error: error.into() }
  }
}

// ---------------------------------------------------------------------------
// Push channel
// ---------------------------------------------------------------------------

/// One event on the push channel. The payload is shared by every subscriber
/// of a single broadcast.
#[derive(Debug, Clone)]
pub struct PushEvent {
  pub event: &'static str,
  pub payload: Arc<Value>,
}

impl PushEvent {
  pub fn new(event: &'static str, payload: Arc<Value>) -> Self {
    Self { event, payload }
  }
}
