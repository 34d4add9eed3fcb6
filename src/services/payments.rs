//! Payment-provider webhook verification and reconciliation.
//!
//! The provider signs each delivery with a shared secret:
//! `Stripe-Signature: t=<unix-ts>,v1=<hex hmac-sha256>` where the MAC is
//! computed over `"{t}.{raw body}"`. Verification must pass before any
//! state is touched; a verified `checkout.session.completed` event then
//! transitions the referenced booking's payment to Completed.
//!
//! Deliveries may be duplicated or arrive out of order. Event ids are
//! persisted after a successful apply, so a replay short-circuits to a
//! no-op; missing bookings/payments are accepted silently so the
//! provider's retry can land later.

use std::collections::HashMap;
use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::info;
use uuid::Uuid;

use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::PaymentStatus;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the provider signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Event type that completes a payment.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Default acceptance window for the signed timestamp.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(5 * 60);

/// Webhook verification / parsing failures. All map to a client error;
/// none of them mutate state.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("invalid signature header: {0}")]
    SignatureHeader(String),

    #[error("signature verification failed")]
    SignatureMismatch,

    #[error("signed timestamp outside tolerance")]
    StaleTimestamp,

    #[error("malformed event payload: {0}")]
    Payload(String),
}

/// A verified provider event.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    /// Booking referenced by the event metadata; always present for
    /// checkout-completed events.
    pub booking_id: Option<Uuid>,
}

/// What applying a verified event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Event type carries no action for this service.
    Ignored,
    /// Event id was already processed.
    Duplicate,
    /// Referenced booking does not exist (out-of-order delivery).
    BookingMissing,
    /// Booking exists but carries no payment record.
    PaymentMissing,
    /// Payment was already Completed.
    AlreadyCompleted,
    /// Payment transitioned to Completed.
    Completed,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::BookingMissing => "booking_missing",
            WebhookOutcome::PaymentMissing => "payment_missing",
            WebhookOutcome::AlreadyCompleted => "already_completed",
            WebhookOutcome::Completed => "completed",
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Option<EventData>,
}

#[derive(Debug, Deserialize)]
struct EventData {
    #[serde(default)]
    object: Option<EventObject>,
}

#[derive(Debug, Deserialize)]
struct EventObject {
    #[serde(default)]
    metadata: HashMap<String, String>,
}

fn mac_for(secret: &str, timestamp: i64, body: &str) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    mac
}

/// Compute the signature header value for `body` at `timestamp`.
///
/// Counterpart of [`verify_and_parse`]; used by the test suites and
/// local tooling to craft valid deliveries.
pub fn signature_header(body: &str, secret: &str, timestamp: i64) -> String {
    let signature = mac_for(secret, timestamp, body).finalize().into_bytes();
    format!("t={},v1={}", timestamp, hex::encode(signature))
}

/// Verify `signature_header` against the raw `body` and parse the event.
///
/// The timestamp must fall within `tolerance` of the current time
/// (pass [`Duration::ZERO`] to skip the freshness check). Verification
/// failures never touch state.
pub fn verify_and_parse(
    body: &str,
    signature_header: &str,
    secret: &str,
    tolerance: Duration,
) -> Result<WebhookEvent, PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in signature_header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    PaymentError::SignatureHeader(format!("bad timestamp: {value}"))
                })?);
            }
            "v1" => {
                let decoded = hex::decode(value).map_err(|_| {
                    PaymentError::SignatureHeader("signature is not hex".to_string())
                })?;
                candidates.push(decoded);
            }
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| PaymentError::SignatureHeader("missing t=".to_string()))?;
    if candidates.is_empty() {
        return Err(PaymentError::SignatureHeader("missing v1=".to_string()));
    }

    if !tolerance.is_zero() {
        let age = (chrono::Utc::now().timestamp() - timestamp).unsigned_abs();
        if age > tolerance.as_secs() {
            return Err(PaymentError::StaleTimestamp);
        }
    }

    let verified = candidates
        .iter()
        .any(|candidate| mac_for(secret, timestamp, body).verify_slice(candidate).is_ok());
    if !verified {
        return Err(PaymentError::SignatureMismatch);
    }

    let envelope: EventEnvelope =
        serde_json::from_str(body).map_err(|e| PaymentError::Payload(e.to_string()))?;

    let booking_id = envelope
        .data
        .as_ref()
        .and_then(|d| d.object.as_ref())
        .and_then(|o| o.metadata.get("bookingId"))
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| PaymentError::Payload(format!("bad bookingId: {raw}")))
        })
        .transpose()?;

    if envelope.event_type == CHECKOUT_COMPLETED && booking_id.is_none() {
        return Err(PaymentError::Payload(
            "checkout.session.completed without bookingId metadata".to_string(),
        ));
    }

    Ok(WebhookEvent {
        id: envelope.id,
        event_type: envelope.event_type,
        booking_id,
    })
}

/// Apply a verified event to the store.
///
/// Only `checkout.session.completed` acts; everything else is accepted
/// and ignored. The event id is recorded after a successful apply, so a
/// redelivery becomes [`WebhookOutcome::Duplicate`]. Missing booking or
/// payment rows are tolerated as no-ops without recording the id, which
/// leaves the provider's retry free to succeed later.
pub async fn apply_webhook_event(
    repository: &dyn FullRepository,
    event: &WebhookEvent,
) -> RepositoryResult<WebhookOutcome> {
    if event.event_type != CHECKOUT_COMPLETED {
        return Ok(WebhookOutcome::Ignored);
    }
    if repository.is_event_processed(&event.id).await? {
        return Ok(WebhookOutcome::Duplicate);
    }
    let Some(booking_id) = event.booking_id else {
        return Ok(WebhookOutcome::BookingMissing);
    };

    let Some((booking, payment)) = repository.find_booking_with_payment(booking_id).await? else {
        return Ok(WebhookOutcome::BookingMissing);
    };
    let Some(payment) = payment else {
        return Ok(WebhookOutcome::PaymentMissing);
    };

    if payment.status == PaymentStatus::Completed {
        repository.record_processed_event(&event.id).await?;
        return Ok(WebhookOutcome::AlreadyCompleted);
    }

    repository
        .update_payment_status(payment.id, PaymentStatus::Completed)
        .await?;
    repository.record_processed_event(&event.id).await?;

    info!(
        event_id = %event.id,
        booking_id = %booking.id,
        payment_id = %payment.id,
        "payment completed via provider webhook"
    );
    Ok(WebhookOutcome::Completed)
}
