//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//!
//! Schema management is out of scope: the tables in [`schema`] are
//! expected to exist before the service starts.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use std::collections::HashSet;
use std::time::Duration;
use tokio::task;
use uuid::Uuid;

use crate::db::repository::{
    BookingRepository, ErrorContext, FlightRepository, FullRepository, RepositoryError,
    RepositoryResult, UserRepository,
};
use crate::models::{
    Booking, DelaySample, Flight, FlightStatus, NewBooking, NewDelaySample, NewFlight, NewUser,
    PaymentRecord, PaymentStatus, User,
};

mod models;
mod schema;

use models::{BookingRow, DelaySampleRow, FlightRow, PaymentRow, UserRow};
use schema::{bookings, flight_delay_samples, flights, payments, users, webhook_events};

type PgPool = Pool<ConnectionManager<PgConnection>>;

diesel::define_sql_function! {
    /// SQL `lower()`, used for case-insensitive matching on text columns.
    fn lower(x: diesel::sql_types::Text) -> diesel::sql_types::Text;
}

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let parse_u32 = |key: &str, default: u32| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(default)
        };
        let parse_u64 = |key: &str, default: u64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            database_url,
            max_pool_size: parse_u32("PG_POOL_MAX", 10),
            min_pool_size: parse_u32("PG_POOL_MIN", 1),
            connection_timeout_sec: parse_u64("PG_CONN_TIMEOUT_SEC", 30),
            idle_timeout_sec: parse_u64("PG_IDLE_TIMEOUT_SEC", 600),
            max_retries: parse_u32("PG_MAX_RETRIES", 3),
            retry_delay_ms: parse_u64("PG_RETRY_DELAY_MS", 100),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository with a validated connection pool.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| RepositoryError::Connection {
                message: e.to_string(),
                context: ErrorContext::new("create_pool")
                    .with_details(format!("max_size={}", config.max_pool_size))
                    .retryable(),
            })?;

        Ok(Self { pool, config })
    }

    /// Execute a database operation on a blocking thread, retrying
    /// transient failures with exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::from(e);
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| RepositoryError::Internal {
            message: format!("Task join error: {}", e),
            context: ErrorContext::new("spawn_blocking"),
        })?
    }
}

#[async_trait]
impl FlightRepository for PostgresRepository {
    async fn list_flights(&self) -> RepositoryResult<Vec<Flight>> {
        let rows = self
            .with_conn(move |conn| {
                flights::table
                    .order(flights::scheduled_at.asc())
                    .load::<FlightRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        rows.into_iter().map(FlightRow::into_domain).collect()
    }

    async fn find_flights_by_origin(&self, city: &str) -> RepositoryResult<Vec<Flight>> {
        let needle = city.to_lowercase();
        let rows = self
            .with_conn(move |conn| {
                flights::table
                    .filter(lower(flights::origin).eq(needle.clone()))
                    .order(flights::scheduled_at.asc())
                    .load::<FlightRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        rows.into_iter().map(FlightRow::into_domain).collect()
    }

    async fn insert_flight(&self, flight: NewFlight) -> RepositoryResult<Flight> {
        let row = FlightRow {
            id: Uuid::new_v4(),
            flight_number: flight.flight_number,
            origin: flight.origin,
            destination: flight.destination,
            scheduled_at: flight.scheduled_at,
            status: flight.status.as_str().to_string(),
        };
        let inserted = self
            .with_conn(move |conn| {
                diesel::insert_into(flights::table)
                    .values(row.clone())
                    .get_result::<FlightRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        inserted.into_domain()
    }

    async fn update_flight_statuses(
        &self,
        changes: &[(Uuid, FlightStatus)],
    ) -> RepositoryResult<usize> {
        if changes.is_empty() {
            return Ok(0);
        }
        let changes: Vec<(Uuid, String)> = changes
            .iter()
            .map(|(id, status)| (*id, status.as_str().to_string()))
            .collect();

        self.with_conn(move |conn| {
            conn.transaction::<usize, RepositoryError, _>(|conn| {
                let mut updated = 0usize;
                for (id, status) in &changes {
                    let rows = diesel::update(flights::table.find(id))
                        .set(flights::status.eq(status))
                        .execute(conn)?;
                    if rows == 0 {
                        return Err(RepositoryError::not_found_with_context(
                            "flight not found",
                            ErrorContext::new("update_flight_statuses")
                                .with_entity("flight")
                                .with_entity_id(id),
                        ));
                    }
                    updated += rows;
                }
                Ok(updated)
            })
        })
        .await
    }

    async fn insert_delay_sample(&self, sample: NewDelaySample) -> RepositoryResult<DelaySample> {
        let row = DelaySampleRow {
            id: Uuid::new_v4(),
            flight_id: sample.flight_id,
            weather: sample.weather,
            delay_probability: sample.delay_probability,
        };
        let inserted = self
            .with_conn(move |conn| {
                diesel::insert_into(flight_delay_samples::table)
                    .values(row.clone())
                    .get_result::<DelaySampleRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        Ok(inserted.into_domain())
    }

    async fn list_flights_with_delay(
        &self,
    ) -> RepositoryResult<Vec<(Flight, Option<DelaySample>)>> {
        let rows = self
            .with_conn(move |conn| {
                flights::table
                    .left_join(flight_delay_samples::table)
                    .order((flights::scheduled_at.asc(), flight_delay_samples::id.asc()))
                    .load::<(FlightRow, Option<DelaySampleRow>)>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;

        // A flight may carry several samples; keep the first per flight.
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for (flight, sample) in rows {
            if !seen.insert(flight.id) {
                continue;
            }
            result.push((
                flight.into_domain()?,
                sample.map(DelaySampleRow::into_domain),
            ));
        }
        Ok(result)
    }
}

#[async_trait]
impl BookingRepository for PostgresRepository {
    async fn create_booking_with_payment(
        &self,
        booking: NewBooking,
        amount_cents: i64,
    ) -> RepositoryResult<(Booking, PaymentRecord)> {
        let now = Utc::now();
        let booking_row = BookingRow {
            id: Uuid::new_v4(),
            flight_id: booking.flight_id,
            user_id: booking.user_id,
            user_name: booking.user_name,
            email: booking.email,
            booked_at: now,
        };
        let payment_row = PaymentRow {
            id: Uuid::new_v4(),
            booking_id: booking_row.id,
            amount_cents,
            status: PaymentStatus::Pending.as_str().to_string(),
            created_at: now,
        };

        let (stored_booking, stored_payment) = self
            .with_conn(move |conn| {
                conn.transaction::<(BookingRow, PaymentRow), RepositoryError, _>(|conn| {
                    let b = diesel::insert_into(bookings::table)
                        .values(booking_row.clone())
                        .get_result::<BookingRow>(conn)?;
                    let p = diesel::insert_into(payments::table)
                        .values(payment_row.clone())
                        .get_result::<PaymentRow>(conn)?;
                    Ok((b, p))
                })
            })
            .await?;
        Ok((stored_booking.into_domain(), stored_payment.into_domain()?))
    }

    async fn find_booking_with_payment(
        &self,
        booking_id: Uuid,
    ) -> RepositoryResult<Option<(Booking, Option<PaymentRecord>)>> {
        let found = self
            .with_conn(move |conn| {
                let booking = bookings::table
                    .find(booking_id)
                    .first::<BookingRow>(conn)
                    .optional()?;
                let Some(booking) = booking else {
                    return Ok(None);
                };
                let payment = payments::table
                    .filter(payments::booking_id.eq(booking_id))
                    .first::<PaymentRow>(conn)
                    .optional()?;
                Ok(Some((booking, payment)))
            })
            .await?;

        match found {
            None => Ok(None),
            Some((booking, payment)) => {
                let payment = payment.map(PaymentRow::into_domain).transpose()?;
                Ok(Some((booking.into_domain(), payment)))
            }
        }
    }

    async fn update_payment_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> RepositoryResult<()> {
        let status = status.as_str().to_string();
        self.with_conn(move |conn| {
            let rows = diesel::update(payments::table.find(payment_id))
                .set(payments::status.eq(status.clone()))
                .execute(conn)?;
            if rows == 0 {
                return Err(RepositoryError::not_found_with_context(
                    "payment not found",
                    ErrorContext::new("update_payment_status")
                        .with_entity("payment")
                        .with_entity_id(payment_id),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn list_bookings(&self) -> RepositoryResult<Vec<Booking>> {
        let rows = self
            .with_conn(move |conn| {
                bookings::table
                    .order(bookings::booked_at.asc())
                    .load::<BookingRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        Ok(rows.into_iter().map(BookingRow::into_domain).collect())
    }

    async fn is_event_processed(&self, event_id: &str) -> RepositoryResult<bool> {
        let event_id = event_id.to_string();
        self.with_conn(move |conn| {
            diesel::select(diesel::dsl::exists(
                webhook_events::table.find(event_id.clone()),
            ))
            .get_result::<bool>(conn)
            .map_err(RepositoryError::from)
        })
        .await
    }

    async fn record_processed_event(&self, event_id: &str) -> RepositoryResult<()> {
        let event_id = event_id.to_string();
        self.with_conn(move |conn| {
            diesel::insert_into(webhook_events::table)
                .values((
                    webhook_events::event_id.eq(event_id.clone()),
                    webhook_events::processed_at.eq(Utc::now()),
                ))
                .on_conflict(webhook_events::event_id)
                .do_nothing()
                .execute(conn)
                .map_err(RepositoryError::from)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let row = UserRow {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role.as_str().to_string(),
        };
        let inserted = self
            .with_conn(move |conn| {
                diesel::insert_into(users::table)
                    .values(row.clone())
                    .get_result::<UserRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        inserted.into_domain()
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let needle = email.to_lowercase();
        let row = self
            .with_conn(move |conn| {
                users::table
                    .filter(lower(users::email).eq(needle.clone()))
                    .first::<UserRow>(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await?;
        row.map(UserRow::into_domain).transpose()
    }

    async fn find_user_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        let row = self
            .with_conn(move |conn| {
                users::table
                    .find(id)
                    .first::<UserRow>(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await?;
        row.map(UserRow::into_domain).transpose()
    }
}

#[async_trait]
impl FullRepository for PostgresRepository {
    async fn ping(&self) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map_err(RepositoryError::from)
        })
        .await
        .map(|_| true)
    }
}
