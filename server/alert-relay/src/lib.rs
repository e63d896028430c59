//! Alert Relay
//!
//! Accepts alert events over HTTP, stamps each with an id and timestamp, and
//! rebroadcasts them to every connected UI client over Server-Sent Events.
//! Serves the static single-page UI alongside.
//!
//! No DB, no history; alerts exist only for the duration of one request.

mod broadcast;
mod config;
mod enrich;
mod error;
mod handlers;
mod logging;
mod routes;
mod server;
mod state;
mod types;

pub use broadcast::{Broadcaster, Delivery, SubscriberId, Subscription};
pub use config::{Config, LogFormat, BODY_LIMIT_BYTES};
pub use enrich::Enricher;
pub use error::RelayError;
pub use logging::init as init_logging;
pub use routes::router;
pub use server::{serve, shutdown_signal};
pub use state::AppState;
pub use types::{Alert, EnrichedAlert, ErrorBody, PushEvent, Received, NEW_ALERT_EVENT};
