//! Repository trait definitions.
//!
//! The traits here are the storage boundary of the service: handlers and
//! services hold an `Arc<dyn FullRepository>` and never see the backing
//! store. Implementations live in [`crate::db::repositories`].

pub mod error;

use async_trait::async_trait;
use uuid::Uuid;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::{
    Booking, DelaySample, Flight, FlightStatus, NewBooking, NewDelaySample, NewFlight, NewUser,
    PaymentRecord, PaymentStatus, User,
};

/// Flight storage operations.
#[async_trait]
pub trait FlightRepository: Send + Sync {
    /// All flights, ordered by scheduled departure.
    async fn list_flights(&self) -> RepositoryResult<Vec<Flight>>;

    /// Flights whose origin matches `city` case-insensitively.
    async fn find_flights_by_origin(&self, city: &str) -> RepositoryResult<Vec<Flight>>;

    /// Administrative flight creation (schedule load, seeding).
    async fn insert_flight(&self, flight: NewFlight) -> RepositoryResult<Flight>;

    /// Apply a batch of status changes as one unit.
    ///
    /// Either every referenced flight is updated or none is; an unknown
    /// flight id fails the whole batch. Returns the number of updated
    /// rows.
    async fn update_flight_statuses(
        &self,
        changes: &[(Uuid, FlightStatus)],
    ) -> RepositoryResult<usize>;

    /// Record a historical delay sample for a flight.
    async fn insert_delay_sample(&self, sample: NewDelaySample) -> RepositoryResult<DelaySample>;

    /// All flights joined with their first delay sample, if any.
    async fn list_flights_with_delay(
        &self,
    ) -> RepositoryResult<Vec<(Flight, Option<DelaySample>)>>;
}

/// Booking and payment storage operations.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Create a booking together with its Pending payment record in one
    /// unit.
    async fn create_booking_with_payment(
        &self,
        booking: NewBooking,
        amount_cents: i64,
    ) -> RepositoryResult<(Booking, PaymentRecord)>;

    /// Look up a booking and its payment record (the payment may be
    /// absent for rows created outside the normal flow).
    async fn find_booking_with_payment(
        &self,
        booking_id: Uuid,
    ) -> RepositoryResult<Option<(Booking, Option<PaymentRecord>)>>;

    /// Persist a payment status transition.
    async fn update_payment_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> RepositoryResult<()>;

    /// All bookings (analytics).
    async fn list_bookings(&self) -> RepositoryResult<Vec<Booking>>;

    /// Whether a provider webhook event id has already been handled.
    async fn is_event_processed(&self, event_id: &str) -> RepositoryResult<bool>;

    /// Record a provider webhook event id as handled. Recording the same
    /// id twice is a no-op.
    async fn record_processed_event(&self, event_id: &str) -> RepositoryResult<()>;
}

/// User account storage operations.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. Fails with [`RepositoryError::Conflict`] when the
    /// email is already registered.
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>>;
}

/// The complete storage interface consumed by the HTTP layer.
#[async_trait]
pub trait FullRepository:
    FlightRepository + BookingRepository + UserRepository + Send + Sync
{
    /// Backend liveness probe for the health endpoint.
    async fn ping(&self) -> RepositoryResult<bool>;
}
