//! Row types mapping the Diesel schema to domain models.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{bookings, flight_delay_samples, flights, payments, users};
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::{
    Booking, DelaySample, Flight, FlightStatus, PaymentRecord, PaymentStatus, Role, User,
};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = flights)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FlightRow {
    pub id: Uuid,
    pub flight_number: String,
    pub origin: String,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
}

impl FlightRow {
    pub fn into_domain(self) -> RepositoryResult<Flight> {
        let status = FlightStatus::parse(&self.status).ok_or_else(|| {
            RepositoryError::validation(format!("unknown flight status: {}", self.status))
        })?;
        Ok(Flight {
            id: self.id,
            flight_number: self.flight_number,
            origin: self.origin,
            destination: self.destination,
            scheduled_at: self.scheduled_at,
            status,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = flight_delay_samples)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DelaySampleRow {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub weather: String,
    pub delay_probability: f64,
}

impl DelaySampleRow {
    pub fn into_domain(self) -> DelaySample {
        DelaySample {
            id: self.id,
            flight_id: self.flight_id,
            weather: self.weather,
            delay_probability: self.delay_probability,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookingRow {
    pub id: Uuid,
    pub flight_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub booked_at: DateTime<Utc>,
}

impl BookingRow {
    pub fn into_domain(self) -> Booking {
        Booking {
            id: self.id,
            flight_id: self.flight_id,
            user_id: self.user_id,
            user_name: self.user_name,
            email: self.email,
            booked_at: self.booked_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentRow {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub amount_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentRow {
    pub fn into_domain(self) -> RepositoryResult<PaymentRecord> {
        let status = PaymentStatus::parse(&self.status).ok_or_else(|| {
            RepositoryError::validation(format!("unknown payment status: {}", self.status))
        })?;
        Ok(PaymentRecord {
            id: self.id,
            booking_id: self.booking_id,
            amount_cents: self.amount_cents,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl UserRow {
    pub fn into_domain(self) -> RepositoryResult<User> {
        let role = Role::parse(&self.role).ok_or_else(|| {
            RepositoryError::validation(format!("unknown user role: {}", self.role))
        })?;
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role,
        })
    }
}
