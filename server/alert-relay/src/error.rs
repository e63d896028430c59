//! Structured error types for the relay and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::types::ErrorBody;

/// Message returned to publishers for any rejected alert body.
pub const INVALID_ALERT_MESSAGE: &str = "Invalid alert";
/// Message returned for internal failures; the detail only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum RelayError {
  /// Body missing, not a JSON object, or without a non-empty string `rule`.
  #[error("invalid alert")]
  InvalidAlert,

  #[error("internal: {0}")]
  Internal(String),

  #[error("config: {var}: {reason}")]
  Config { var: String, reason: String },

  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}

impl RelayError {
  pub fn config(var: &str, reason: &str) -> Self {
    Self::Config {
      var: var.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::Internal(msg.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::InvalidAlert => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for RelayError {
  fn into_response(self) -> Response {
    let message = match &self {
      Self::InvalidAlert => INVALID_ALERT_MESSAGE,
      other => {
        tracing::error!(error = %other, "request failed");
        INTERNAL_ERROR_MESSAGE
      }
    };
    (self.status(), Json(ErrorBody::new(message))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn invalid_alert_maps_to_400() {
    let resp = RelayError::InvalidAlert.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[test]
  fn internal_and_io_map_to_500() {
    assert_eq!(
      RelayError::internal("boom").status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
    let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
    assert_eq!(RelayError::from(io).status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn config_error_names_the_variable() {
    let err = RelayError::config("PORT", "not a valid port");
    assert_eq!(err.to_string(), "config: PORT: not a valid port");
  }
}
