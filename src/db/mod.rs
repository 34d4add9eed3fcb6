//! Storage layer for flights, bookings, payments, and users.
//!
//! This module provides abstractions for storage operations via the
//! Repository pattern, allowing different backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / services (cache, reconcilers)          │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────────────────────┐
//!     │   Local (in-memory)   │   Postgres (Diesel)  │
//!     └──────────────────────────────────────────────┘
//! ```
//!
//! The `local-repo` backend (default) keeps everything in process memory
//! and doubles as the test double. The `postgres-repo` backend persists
//! through Diesel with connection pooling and transient-failure retry.
//! Handlers receive the repository as `Arc<dyn FullRepository>` from
//! application state; there is no global instance.

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;

pub use factory::RepositoryFactory;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::{PostgresConfig, PostgresRepository};
pub use repository::{
    BookingRepository, ErrorContext, FlightRepository, FullRepository, RepositoryError,
    RepositoryResult, UserRepository,
};
