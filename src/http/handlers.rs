//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer (cache, reconcilers) and the repository.

use std::sync::OnceLock;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use regex::Regex;
use tokio::task;
use tracing::{debug, error, warn};

use super::auth::{issue_token, AuthUser};
use super::dto::{
    ChatRequest, ChatResponse, CreateBookingRequest, CreateBookingResponse, CurrentWeatherResponse,
    DailyBookingCount, HealthResponse, LoginRequest, MeResponse, RegisterRequest,
    RegisterResponse, TokenResponse, TrainingRow, UpdatedFlightDto, WeatherSummary, WebhookAck,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{Flight, NewBooking, NewUser, Role};
use crate::services::payments;
use crate::services::weather_reconciler::{reconcile_city_status, WeatherReading};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the store
/// is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.ping().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Flights
// =============================================================================

/// GET /flights
///
/// List all flights, served from the cache while it is fresh.
pub async fn list_flights(State(state): State<AppState>) -> HandlerResult<Vec<Flight>> {
    if let Some(snapshot) = state.flight_cache.get() {
        debug!("Serving flight list from cache");
        return Ok(Json(snapshot));
    }

    let flights = state.repository.list_flights().await?;
    state.flight_cache.set(flights.clone());
    Ok(Json(flights))
}

/// GET /flights/weather/{city}
///
/// Fetch current weather for a city and reconcile the status of every
/// flight departing it as a side effect.
pub async fn flight_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> HandlerResult<WeatherSummary> {
    let current = state
        .weather
        .fetch_current_weather(&city)
        .await
        .map_err(|e| {
            error!("Error fetching weather for {}: {}", city, e);
            AppError::from(e)
        })?;

    let reading = WeatherReading {
        temperature: current.temperature,
        description: current.description.clone(),
    };
    reconcile_city_status(state.repository.as_ref(), &state.flight_cache, &city, &reading)
        .await?;

    Ok(Json(WeatherSummary {
        temperature: current.temperature,
        description: current.description,
    }))
}

/// GET /weather/current/{city}
///
/// Same reconciliation side effect as [`flight_weather`], with a richer
/// response including humidity and the flights whose status changed.
pub async fn current_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> HandlerResult<CurrentWeatherResponse> {
    let current = state
        .weather
        .fetch_current_weather(&city)
        .await
        .map_err(|e| {
            error!("Error fetching weather for {}: {}", city, e);
            AppError::from(e)
        })?;

    let reading = WeatherReading {
        temperature: current.temperature,
        description: current.description.clone(),
    };
    let changed =
        reconcile_city_status(state.repository.as_ref(), &state.flight_cache, &city, &reading)
            .await?;

    Ok(Json(CurrentWeatherResponse {
        city,
        temperature: current.temperature,
        description: current.description,
        humidity: current.humidity,
        updated_flights: changed
            .into_iter()
            .map(|(id, status)| UpdatedFlightDto { id, status })
            .collect(),
    }))
}

/// GET /flights/data
///
/// Per-flight training rows: first delay sample plus current status.
pub async fn flight_training_data(
    State(state): State<AppState>,
) -> HandlerResult<Vec<TrainingRow>> {
    let flights = state.repository.list_flights_with_delay().await?;

    let rows = flights
        .into_iter()
        .map(|(flight, sample)| TrainingRow {
            weather: sample
                .as_ref()
                .map(|s| s.weather.clone())
                .unwrap_or_else(|| "Clear".to_string()),
            delay_probability: sample.map(|s| s.delay_probability).unwrap_or(0.0),
            status: flight.status,
        })
        .collect();
    Ok(Json(rows))
}

// =============================================================================
// Bookings & Payments
// =============================================================================

/// POST /bookings
///
/// Create a booking together with its Pending payment record. Checkout
/// with the payment provider happens on the frontend; this endpoint only
/// persists the records the webhook later completes.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    if request.user_name.trim().is_empty() {
        return Err(AppError::BadRequest("user_name is required".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::BadRequest("email is invalid".to_string()));
    }
    if request.amount_cents <= 0 {
        return Err(AppError::BadRequest(
            "amount_cents must be positive".to_string(),
        ));
    }

    let (booking, payment) = state
        .repository
        .create_booking_with_payment(
            NewBooking {
                flight_id: request.flight_id,
                user_id: request.user_id,
                user_name: request.user_name,
                email: request.email,
            },
            request.amount_cents,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking_id: booking.id,
            payment_id: payment.id,
            amount_cents: payment.amount_cents,
            payment_status: payment.status,
        }),
    ))
}

/// POST /payments/webhook
///
/// Verify a provider delivery against the raw body and apply it. A bad
/// signature is a client error and mutates nothing; verified no-op
/// outcomes (duplicate, unknown booking) still return 200 so the
/// provider stops retrying.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> HandlerResult<WebhookAck> {
    let signature = headers
        .get(payments::SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let event = payments::verify_and_parse(
        &body,
        signature,
        &state.config.webhook_secret,
        payments::DEFAULT_TOLERANCE,
    )
    .map_err(|e| {
        warn!("Rejected webhook delivery: {}", e);
        AppError::BadRequest(format!("Webhook error: {}", e))
    })?;

    let outcome = payments::apply_webhook_event(state.repository.as_ref(), &event).await?;

    Ok(Json(WebhookAck {
        received: true,
        outcome: outcome.as_str().to_string(),
    }))
}

// =============================================================================
// Auth
// =============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if request.username.trim().len() < 3 {
        return Err(AppError::BadRequest(
            "username must be at least 3 characters".to_string(),
        ));
    }
    if !request.email.contains('@') {
        return Err(AppError::BadRequest("email is invalid".to_string()));
    }
    if request.password.len() < 6 {
        return Err(AppError::BadRequest(
            "password must be at least 6 characters".to_string(),
        ));
    }

    if state
        .repository
        .find_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("Email already exists.".to_string()));
    }

    // bcrypt is deliberately slow; keep it off the async runtime.
    let password = request.password;
    let password_hash = task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))?;

    let user = state
        .repository
        .create_user(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
            role: Role::User,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            message: "User registered successfully.".to_string(),
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult<TokenResponse> {
    let user = state.repository.find_user_by_email(&request.email).await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized(
            "Invalid email or password.".to_string(),
        ));
    };

    let password = request.password;
    let hash = user.password_hash.clone();
    let verified = task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))?
        .unwrap_or(false);

    if !verified {
        return Err(AppError::Unauthorized(
            "Invalid email or password.".to_string(),
        ));
    }

    let token = issue_token(&user, &state.config.auth)?;
    Ok(Json(TokenResponse { token }))
}

/// GET /auth/me
pub async fn me(user: AuthUser) -> HandlerResult<MeResponse> {
    Ok(Json(MeResponse {
        user_id: user.user_id,
        username: user.username,
        role: user.role,
    }))
}

// =============================================================================
// Chat Assistant
// =============================================================================

fn flight_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[A-Za-z]{2}\d{3,4}\b").expect("valid regex"))
}

/// Find a flight-number token ("PS101") in a chat message.
fn extract_flight_number(message: &str) -> Option<String> {
    flight_number_pattern()
        .find(message)
        .map(|m| m.as_str().to_uppercase())
}

/// POST /chat
///
/// Answer a user question with a snapshot of current flights as context.
/// When the message names a flight number, its details are appended to
/// the assistant's reply.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> HandlerResult<ChatResponse> {
    if request.message.trim().is_empty() {
        warn!("Chat request failed: empty message.");
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    let flights = state.repository.list_flights_with_delay().await?;
    debug!("Loaded {} flights for chat processing", flights.len());

    let snapshot: Vec<serde_json::Value> = flights
        .iter()
        .take(10)
        .map(|(flight, sample)| {
            serde_json::json!({
                "flight_number": flight.flight_number,
                "from": flight.origin,
                "to": flight.destination,
                "time": flight.scheduled_at,
                "status": flight.status,
                "delay_probability": sample.as_ref().map(|s| s.delay_probability).unwrap_or(0.0),
            })
        })
        .collect();

    let prompt = format!(
        "You are a helpful airport assistant. Current flight data: {}. \
         Answer the user's question naturally and concisely. If the \
         question concerns a specific flight, include its details. \
         Question: {}",
        serde_json::Value::Array(snapshot),
        request.message
    );

    let mut answer = state.assistant.complete(&prompt).await.map_err(|e| {
        error!("Assistant request failed: {}", e);
        AppError::from(e)
    })?;

    if let Some(number) = extract_flight_number(&request.message) {
        if let Some((flight, sample)) = flights
            .iter()
            .find(|(f, _)| f.flight_number.eq_ignore_ascii_case(&number))
        {
            answer.push_str(&format!(
                "\nFlight {}: {} to {}, status: {}, delay probability: {:.2}",
                flight.flight_number,
                flight.origin,
                flight.destination,
                flight.status,
                sample.as_ref().map(|s| s.delay_probability).unwrap_or(0.0),
            ));
        }
    }

    Ok(Json(ChatResponse { response: answer }))
}

// =============================================================================
// Analytics
// =============================================================================

/// GET /analytics/bookings
///
/// Bookings-per-day counts for the last 7 days, oldest day first.
pub async fn booking_analytics(
    State(state): State<AppState>,
) -> HandlerResult<Vec<DailyBookingCount>> {
    let bookings = state.repository.list_bookings().await?;
    let today = Utc::now().date_naive();

    let counts = (0..7)
        .rev()
        .map(|days_ago| {
            let date = today - chrono::Duration::days(days_ago);
            let count = bookings
                .iter()
                .filter(|b| b.booked_at.date_naive() == date)
                .count();
            DailyBookingCount { date, count }
        })
        .collect();
    Ok(Json(counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_flight_numbers_in_questions() {
        assert_eq!(
            extract_flight_number("when does PS101 leave?"),
            Some("PS101".to_string())
        );
        assert_eq!(
            extract_flight_number("status of lh1492 please"),
            Some("LH1492".to_string())
        );
        assert_eq!(extract_flight_number("any delays today?"), None);
        // Needs exactly two letters then digits.
        assert_eq!(extract_flight_number("gate A12"), None);
    }
}
