//! # Airport Booking Backend
//!
//! REST backend for an airport flight-booking system.
//!
//! This crate provides the HTTP API used by the booking frontend: flight
//! listings served through a time-bounded in-memory cache, weather-driven
//! flight-status reconciliation, booking and payment records with a
//! provider-webhook completion flow, user registration/login, and a
//! chat-style assistant proxied to a generative API.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain types (flights, bookings, payments, users)
//! - [`db`]: Repository pattern and persistence backends
//! - [`services`]: Business logic — flight cache, weather reconciler,
//!   payment webhook handling
//! - [`clients`]: Outbound HTTP clients (weather provider, assistant)
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Backends
//!
//! Storage is selected by cargo feature: `local-repo` (default) keeps all
//! state in memory, `postgres-repo` persists through Diesel/PostgreSQL.

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod clients;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
