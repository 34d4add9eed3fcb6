//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression,
//! tracing), and creates the axum router ready for serving.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Flights
        .route("/flights", get(handlers::list_flights))
        .route("/flights/data", get(handlers::flight_training_data))
        .route("/flights/weather/{city}", get(handlers::flight_weather))
        .route("/weather/current/{city}", get(handlers::current_weather))
        // Bookings & payments
        .route("/bookings", post(handlers::create_booking))
        .route("/payments/webhook", post(handlers::payment_webhook))
        // Auth
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        // Assistant & analytics
        .route("/chat", post(handlers::chat))
        .route("/analytics/bookings", get(handlers::booking_analytics))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
