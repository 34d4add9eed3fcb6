//! In-memory repository implementation.
//!
//! Default backend for local development and the test suites. All state
//! lives behind a single `parking_lot::RwLock`; guards are never held
//! across await points.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::repository::{
    BookingRepository, ErrorContext, FlightRepository, FullRepository, RepositoryError,
    RepositoryResult, UserRepository,
};
use crate::models::{
    Booking, DelaySample, Flight, FlightStatus, NewBooking, NewDelaySample, NewFlight, NewUser,
    PaymentRecord, PaymentStatus, User,
};

#[derive(Default)]
struct Inner {
    flights: HashMap<Uuid, Flight>,
    // Insertion order preserved so "first sample" is deterministic.
    delay_samples: Vec<DelaySample>,
    bookings: HashMap<Uuid, Booking>,
    payments: HashMap<Uuid, PaymentRecord>,
    users: HashMap<Uuid, User>,
    processed_events: HashSet<String>,
}

/// In-memory implementation of [`FullRepository`].
#[derive(Default)]
pub struct LocalRepository {
    inner: RwLock<Inner>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlightRepository for LocalRepository {
    async fn list_flights(&self) -> RepositoryResult<Vec<Flight>> {
        let inner = self.inner.read();
        let mut flights: Vec<Flight> = inner.flights.values().cloned().collect();
        flights.sort_by(|a, b| {
            a.scheduled_at
                .cmp(&b.scheduled_at)
                .then_with(|| a.flight_number.cmp(&b.flight_number))
        });
        Ok(flights)
    }

    async fn find_flights_by_origin(&self, city: &str) -> RepositoryResult<Vec<Flight>> {
        let inner = self.inner.read();
        let mut flights: Vec<Flight> = inner
            .flights
            .values()
            .filter(|f| f.origin.eq_ignore_ascii_case(city))
            .cloned()
            .collect();
        flights.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(flights)
    }

    async fn insert_flight(&self, flight: NewFlight) -> RepositoryResult<Flight> {
        let stored = Flight {
            id: Uuid::new_v4(),
            flight_number: flight.flight_number,
            origin: flight.origin,
            destination: flight.destination,
            scheduled_at: flight.scheduled_at,
            status: flight.status,
        };
        self.inner.write().flights.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_flight_statuses(
        &self,
        changes: &[(Uuid, FlightStatus)],
    ) -> RepositoryResult<usize> {
        let mut inner = self.inner.write();

        // All-or-nothing: reject the whole batch on an unknown id.
        if let Some((missing, _)) = changes.iter().find(|(id, _)| !inner.flights.contains_key(id))
        {
            return Err(RepositoryError::not_found_with_context(
                "flight not found",
                ErrorContext::new("update_flight_statuses")
                    .with_entity("flight")
                    .with_entity_id(missing),
            ));
        }

        for (id, status) in changes {
            if let Some(flight) = inner.flights.get_mut(id) {
                flight.status = *status;
            }
        }
        Ok(changes.len())
    }

    async fn insert_delay_sample(&self, sample: NewDelaySample) -> RepositoryResult<DelaySample> {
        let mut inner = self.inner.write();
        if !inner.flights.contains_key(&sample.flight_id) {
            return Err(RepositoryError::not_found_with_context(
                "flight not found",
                ErrorContext::new("insert_delay_sample")
                    .with_entity("flight")
                    .with_entity_id(sample.flight_id),
            ));
        }
        let stored = DelaySample {
            id: Uuid::new_v4(),
            flight_id: sample.flight_id,
            weather: sample.weather,
            delay_probability: sample.delay_probability,
        };
        inner.delay_samples.push(stored.clone());
        Ok(stored)
    }

    async fn list_flights_with_delay(
        &self,
    ) -> RepositoryResult<Vec<(Flight, Option<DelaySample>)>> {
        let flights = self.list_flights().await?;
        let inner = self.inner.read();
        Ok(flights
            .into_iter()
            .map(|flight| {
                let sample = inner
                    .delay_samples
                    .iter()
                    .find(|s| s.flight_id == flight.id)
                    .cloned();
                (flight, sample)
            })
            .collect())
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn create_booking_with_payment(
        &self,
        booking: NewBooking,
        amount_cents: i64,
    ) -> RepositoryResult<(Booking, PaymentRecord)> {
        let now = Utc::now();
        let stored_booking = Booking {
            id: Uuid::new_v4(),
            flight_id: booking.flight_id,
            user_id: booking.user_id,
            user_name: booking.user_name,
            email: booking.email,
            booked_at: now,
        };
        let payment = PaymentRecord {
            id: Uuid::new_v4(),
            booking_id: stored_booking.id,
            amount_cents,
            status: PaymentStatus::Pending,
            created_at: now,
        };

        let mut inner = self.inner.write();
        inner
            .bookings
            .insert(stored_booking.id, stored_booking.clone());
        inner.payments.insert(payment.id, payment.clone());
        Ok((stored_booking, payment))
    }

    async fn find_booking_with_payment(
        &self,
        booking_id: Uuid,
    ) -> RepositoryResult<Option<(Booking, Option<PaymentRecord>)>> {
        let inner = self.inner.read();
        Ok(inner.bookings.get(&booking_id).map(|booking| {
            let payment = inner
                .payments
                .values()
                .find(|p| p.booking_id == booking_id)
                .cloned();
            (booking.clone(), payment)
        }))
    }

    async fn update_payment_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> RepositoryResult<()> {
        let mut inner = self.inner.write();
        match inner.payments.get_mut(&payment_id) {
            Some(payment) => {
                payment.status = status;
                Ok(())
            }
            None => Err(RepositoryError::not_found_with_context(
                "payment not found",
                ErrorContext::new("update_payment_status")
                    .with_entity("payment")
                    .with_entity_id(payment_id),
            )),
        }
    }

    async fn list_bookings(&self) -> RepositoryResult<Vec<Booking>> {
        let inner = self.inner.read();
        let mut bookings: Vec<Booking> = inner.bookings.values().cloned().collect();
        bookings.sort_by(|a, b| a.booked_at.cmp(&b.booked_at));
        Ok(bookings)
    }

    async fn is_event_processed(&self, event_id: &str) -> RepositoryResult<bool> {
        Ok(self.inner.read().processed_events.contains(event_id))
    }

    async fn record_processed_event(&self, event_id: &str) -> RepositoryResult<()> {
        self.inner
            .write()
            .processed_events
            .insert(event_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let mut inner = self.inner.write();
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepositoryError::conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }
        let stored = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        inner.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let inner = self.inner.read();
        Ok(inner
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }
}

#[async_trait]
impl FullRepository for LocalRepository {
    async fn ping(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}
