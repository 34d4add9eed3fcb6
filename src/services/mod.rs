//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository: the flight
//! cache and weather reconciler implement the status-update path, and the
//! payments module implements webhook verification and the payment state
//! transition.

pub mod flight_cache;
pub mod payments;
pub mod weather_reconciler;

pub use flight_cache::{CacheConfig, Clock, FlightCache, SystemClock};
pub use payments::{
    apply_webhook_event, signature_header, verify_and_parse, PaymentError, WebhookEvent,
    WebhookOutcome,
};
pub use weather_reconciler::{reconcile_city_status, status_for, WeatherReading};
