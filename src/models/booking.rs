//! Booking and payment domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A seat booking made by a user for a flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub booked_at: DateTime<Utc>,
}

/// Payload for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
}

/// State of a booking's payment.
///
/// Transitions only `Pending -> Completed`, driven by the provider
/// webhook. Re-completing an already completed record is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    /// Wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Completed => "Completed",
        }
    }

    /// Parse the wire/database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(PaymentStatus::Pending),
            "Completed" => Some(PaymentStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment record attached to exactly one booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Amount in integer cents.
    pub amount_cents: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
