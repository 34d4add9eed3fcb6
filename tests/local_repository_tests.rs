//! Behavioral tests for the in-memory repository.

use chrono::{Duration, Utc};
use uuid::Uuid;

use airport_api::db::repositories::LocalRepository;
use airport_api::db::{BookingRepository, FlightRepository, FullRepository, UserRepository};
use airport_api::models::{
    FlightStatus, NewBooking, NewDelaySample, NewFlight, NewUser, PaymentStatus, Role,
};

fn flight(number: &str, origin: &str, offset_hours: i64) -> NewFlight {
    NewFlight {
        flight_number: number.to_string(),
        origin: origin.to_string(),
        destination: "Vienna".to_string(),
        scheduled_at: Utc::now() + Duration::hours(offset_hours),
        status: FlightStatus::OnTime,
    }
}

#[tokio::test]
async fn list_flights_orders_by_departure() {
    let repo = LocalRepository::new();
    repo.insert_flight(flight("PS300", "Odesa", 9)).await.unwrap();
    repo.insert_flight(flight("PS100", "Kyiv", 1)).await.unwrap();
    repo.insert_flight(flight("PS200", "Lviv", 5)).await.unwrap();

    let flights = repo.list_flights().await.unwrap();
    let numbers: Vec<&str> = flights.iter().map(|f| f.flight_number.as_str()).collect();
    assert_eq!(numbers, ["PS100", "PS200", "PS300"]);
}

#[tokio::test]
async fn origin_lookup_is_case_insensitive() {
    let repo = LocalRepository::new();
    repo.insert_flight(flight("PS100", "Kyiv", 1)).await.unwrap();

    for query in ["Kyiv", "kyiv", "KYIV", "kYiV"] {
        let found = repo.find_flights_by_origin(query).await.unwrap();
        assert_eq!(found.len(), 1, "query {query}");
    }
    assert!(repo.find_flights_by_origin("Lviv").await.unwrap().is_empty());
}

#[tokio::test]
async fn status_batch_is_all_or_nothing() {
    let repo = LocalRepository::new();
    let a = repo.insert_flight(flight("PS100", "Kyiv", 1)).await.unwrap().id;

    let changes = vec![(a, FlightStatus::Delayed), (Uuid::new_v4(), FlightStatus::Delayed)];
    let err = repo.update_flight_statuses(&changes).await.unwrap_err();
    assert!(err.is_not_found());

    // The known flight must not have been touched by the failed batch.
    let flights = repo.find_flights_by_origin("Kyiv").await.unwrap();
    assert_eq!(flights[0].status, FlightStatus::OnTime);
}

#[tokio::test]
async fn status_batch_updates_every_row() {
    let repo = LocalRepository::new();
    let a = repo.insert_flight(flight("PS100", "Kyiv", 1)).await.unwrap().id;
    let b = repo.insert_flight(flight("PS200", "Kyiv", 2)).await.unwrap().id;

    let updated = repo
        .update_flight_statuses(&[(a, FlightStatus::Delayed), (b, FlightStatus::Delayed)])
        .await
        .unwrap();
    assert_eq!(updated, 2);

    for f in repo.find_flights_by_origin("Kyiv").await.unwrap() {
        assert_eq!(f.status, FlightStatus::Delayed);
    }
}

#[tokio::test]
async fn delay_sample_requires_existing_flight() {
    let repo = LocalRepository::new();
    let err = repo
        .insert_delay_sample(NewDelaySample {
            flight_id: Uuid::new_v4(),
            weather: "Rain".to_string(),
            delay_probability: 0.5,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn first_delay_sample_wins_in_join() {
    let repo = LocalRepository::new();
    let id = repo.insert_flight(flight("PS100", "Kyiv", 1)).await.unwrap().id;
    for (weather, p) in [("Rain", 0.7), ("Clear", 0.1)] {
        repo.insert_delay_sample(NewDelaySample {
            flight_id: id,
            weather: weather.to_string(),
            delay_probability: p,
        })
        .await
        .unwrap();
    }

    let joined = repo.list_flights_with_delay().await.unwrap();
    let sample = joined[0].1.as_ref().unwrap();
    assert_eq!(sample.weather, "Rain");
    assert_eq!(sample.delay_probability, 0.7);
}

#[tokio::test]
async fn booking_is_created_with_pending_payment() {
    let repo = LocalRepository::new();
    let (booking, payment) = repo
        .create_booking_with_payment(
            NewBooking {
                flight_id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                user_name: "Olena".to_string(),
                email: "olena@example.com".to_string(),
            },
            12_500,
        )
        .await
        .unwrap();

    assert_eq!(payment.booking_id, booking.id);
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount_cents, 12_500);

    let (found, found_payment) = repo
        .find_booking_with_payment(booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, booking.id);
    assert_eq!(found_payment.unwrap().id, payment.id);
}

#[tokio::test]
async fn unknown_booking_lookup_returns_none() {
    let repo = LocalRepository::new();
    assert!(repo
        .find_booking_with_payment(Uuid::new_v4())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn payment_status_update_requires_existing_payment() {
    let repo = LocalRepository::new();
    let err = repo
        .update_payment_status(Uuid::new_v4(), PaymentStatus::Completed)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn event_ids_record_once() {
    let repo = LocalRepository::new();
    assert!(!repo.is_event_processed("evt_1").await.unwrap());

    repo.record_processed_event("evt_1").await.unwrap();
    assert!(repo.is_event_processed("evt_1").await.unwrap());

    // Recording again is a no-op.
    repo.record_processed_event("evt_1").await.unwrap();
    assert!(repo.is_event_processed("evt_1").await.unwrap());
    assert!(!repo.is_event_processed("evt_2").await.unwrap());
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let repo = LocalRepository::new();
    let user = NewUser {
        username: "olena".to_string(),
        email: "olena@example.com".to_string(),
        password_hash: "hash".to_string(),
        role: Role::User,
    };
    repo.create_user(user.clone()).await.unwrap();

    let mut second = user;
    second.username = "olena2".to_string();
    second.email = "OLENA@example.com".to_string();
    let err = repo.create_user(second).await.unwrap_err();
    assert!(matches!(
        err,
        airport_api::db::RepositoryError::Conflict { .. }
    ));
}

#[tokio::test]
async fn user_lookup_by_email_and_id() {
    let repo = LocalRepository::new();
    let created = repo
        .create_user(NewUser {
            username: "olena".to_string(),
            email: "olena@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
        })
        .await
        .unwrap();

    let by_email = repo
        .find_user_by_email("olena@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, created.id);

    let by_id = repo.find_user_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "olena");

    assert!(repo
        .find_user_by_email("nobody@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn ping_succeeds() {
    let repo = LocalRepository::new();
    assert!(repo.ping().await.unwrap());
}
