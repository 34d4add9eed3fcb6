//! Data Transfer Objects for the HTTP API.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FlightStatus, PaymentStatus, Role};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Storage backend status
    pub database: String,
}

/// Response body for `GET /flights/weather/{city}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSummary {
    /// Temperature in °C
    pub temperature: f64,
    /// Free-text description, when the provider reported one
    pub description: Option<String>,
}

/// A flight whose status changed during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedFlightDto {
    pub id: Uuid,
    pub status: FlightStatus,
}

/// Response body for `GET /weather/current/{city}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentWeatherResponse {
    pub city: String,
    pub temperature: f64,
    pub description: Option<String>,
    pub humidity: Option<u8>,
    /// Flights whose status the reading changed
    pub updated_flights: Vec<UpdatedFlightDto>,
}

/// One row of `GET /flights/data` training output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRow {
    /// Weather label of the flight's first delay sample ("Clear" when absent)
    pub weather: String,
    /// Delay probability of the first sample (0.0 when absent)
    pub delay_probability: f64,
    pub status: FlightStatus,
}

/// Request body for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    /// Amount due in integer cents
    pub amount_cents: i64,
}

/// Response for booking creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub booking_id: Uuid,
    pub payment_id: Uuid,
    pub amount_cents: i64,
    pub payment_status: PaymentStatus,
}

/// Acknowledgement for an accepted webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    /// What the delivery did (completed, duplicate, booking_missing, ...)
    pub outcome: String,
}

/// Request body for user registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Response for user registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub message: String,
}

/// Request body for login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Authenticated identity echo for `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Request body for the chat assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Bookings made on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBookingCount {
    pub date: NaiveDate,
    pub count: usize,
}
