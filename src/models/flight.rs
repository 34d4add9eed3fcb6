//! Flight domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational status of a flight.
///
/// Serialized as `"On Time"` / `"Delayed"`, which is the wire format the
/// frontend and the stored rows both use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightStatus {
    #[serde(rename = "On Time")]
    OnTime,
    Delayed,
}

impl FlightStatus {
    /// Wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightStatus::OnTime => "On Time",
            FlightStatus::Delayed => "Delayed",
        }
    }

    /// Parse the wire/database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "On Time" => Some(FlightStatus::OnTime),
            "Delayed" => Some(FlightStatus::Delayed),
            _ => None,
        }
    }
}

impl fmt::Display for FlightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled flight.
///
/// The `status` field is owned by the weather reconciler; every other
/// field changes only through administrative entry. Flights are never
/// deleted by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: FlightStatus,
}

/// Payload for administrative flight creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: FlightStatus,
}

/// Historical weather observation with the delay probability recorded for
/// a flight. Read-only from the service's perspective; samples feed the
/// training-data endpoint and the chat assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelaySample {
    pub id: Uuid,
    pub flight_id: Uuid,
    /// Free-text weather label, e.g. "Rain" or "Clear".
    pub weather: String,
    /// Probability of delay in `[0.0, 1.0]`.
    pub delay_probability: f64,
}

/// Payload for recording a delay sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDelaySample {
    pub flight_id: Uuid,
    pub weather: String,
    pub delay_probability: f64,
}
