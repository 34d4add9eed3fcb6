//! Weather-driven flight status reconciliation.
//!
//! Applies the current weather of a city to every flight departing that
//! city: a fixed rule maps the reading to On Time / Delayed and the
//! result overwrites each flight's status, then the flight cache is
//! invalidated so readers see the new statuses immediately. The
//! overwrite is deliberate — a flight delayed by hand for other reasons
//! is reset when the weather clears.

use tracing::info;
use uuid::Uuid;

use crate::db::repository::{FullRepository, RepositoryResult};
use crate::models::FlightStatus;
use crate::services::flight_cache::FlightCache;

/// A current-conditions reading for a city.
#[derive(Debug, Clone)]
pub struct WeatherReading {
    /// Temperature in °C.
    pub temperature: f64,
    /// Free-text description; `None` when the provider omits it.
    pub description: Option<String>,
}

/// Status implied by a weather reading: Delayed on sub-zero temperature
/// or any mention of rain or snow (case-insensitive substring match).
/// A missing description leaves only the temperature rule.
pub fn status_for(temperature: f64, description: Option<&str>) -> FlightStatus {
    let wet = description
        .map(|d| {
            let d = d.to_ascii_lowercase();
            d.contains("rain") || d.contains("snow")
        })
        .unwrap_or(false);
    if temperature < 0.0 || wet {
        FlightStatus::Delayed
    } else {
        FlightStatus::OnTime
    }
}

/// Overwrite the status of every flight departing `city` (matched
/// case-insensitively) according to `reading`, persist all changes in
/// one unit, then invalidate the flight cache.
///
/// Returns the `(flight id, new status)` pairs that actually changed.
/// Zero matching flights is a no-op, not an error. The cache is only
/// invalidated after the store write commits; when the write fails,
/// nothing was mutated and the cached snapshot stays valid.
pub async fn reconcile_city_status(
    repository: &dyn FullRepository,
    cache: &FlightCache,
    city: &str,
    reading: &WeatherReading,
) -> RepositoryResult<Vec<(Uuid, FlightStatus)>> {
    let flights = repository.find_flights_by_origin(city).await?;
    if flights.is_empty() {
        return Ok(Vec::new());
    }

    let new_status = status_for(reading.temperature, reading.description.as_deref());
    let changed: Vec<(Uuid, FlightStatus)> = flights
        .iter()
        .filter(|f| f.status != new_status)
        .map(|f| (f.id, new_status))
        .collect();

    if changed.is_empty() {
        return Ok(changed);
    }

    repository.update_flight_statuses(&changed).await?;
    cache.invalidate();

    info!(
        city,
        temperature = reading.temperature,
        status = %new_status,
        updated = changed.len(),
        "flight statuses reconciled from weather"
    );
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FlightRepository;
    use crate::models::NewFlight;

    fn reading(temperature: f64, description: &str) -> WeatherReading {
        WeatherReading {
            temperature,
            description: Some(description.to_string()),
        }
    }

    async fn seed_flight(repo: &LocalRepository, origin: &str, status: FlightStatus) -> Uuid {
        repo.insert_flight(NewFlight {
            flight_number: "PS101".to_string(),
            origin: origin.to_string(),
            destination: "Vienna".to_string(),
            scheduled_at: Utc::now(),
            status,
        })
        .await
        .unwrap()
        .id
    }

    #[test]
    fn freezing_temperature_delays() {
        assert_eq!(status_for(-3.0, Some("Clear")), FlightStatus::Delayed);
        assert_eq!(status_for(-0.1, None), FlightStatus::Delayed);
    }

    #[test]
    fn rain_or_snow_delays_in_any_case() {
        assert_eq!(status_for(10.0, Some("light rain")), FlightStatus::Delayed);
        assert_eq!(status_for(10.0, Some("Heavy SNOW")), FlightStatus::Delayed);
        assert_eq!(status_for(0.0, Some("Rain showers")), FlightStatus::Delayed);
    }

    #[test]
    fn mild_dry_weather_is_on_time() {
        assert_eq!(status_for(15.0, Some("clear sky")), FlightStatus::OnTime);
        assert_eq!(status_for(0.0, Some("overcast")), FlightStatus::OnTime);
        assert_eq!(status_for(5.0, None), FlightStatus::OnTime);
    }

    #[tokio::test]
    async fn kyiv_flights_delayed_by_frost() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        let a = seed_flight(&repo, "Kyiv", FlightStatus::OnTime).await;
        let b = seed_flight(&repo, "Kyiv", FlightStatus::OnTime).await;
        seed_flight(&repo, "Warsaw", FlightStatus::OnTime).await;

        let changed = reconcile_city_status(&repo, &cache, "Kyiv", &reading(-3.0, "Clear"))
            .await
            .unwrap();

        let mut ids: Vec<Uuid> = changed.iter().map(|(id, _)| *id).collect();
        ids.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(ids, expected);
        assert!(changed
            .iter()
            .all(|(_, status)| *status == FlightStatus::Delayed));

        for flight in repo.find_flights_by_origin("Kyiv").await.unwrap() {
            assert_eq!(flight.status, FlightStatus::Delayed);
        }
        // Non-matching origin untouched.
        let warsaw = repo.find_flights_by_origin("Warsaw").await.unwrap();
        assert_eq!(warsaw[0].status, FlightStatus::OnTime);
    }

    #[tokio::test]
    async fn lviv_rain_delays_even_when_warm() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        seed_flight(&repo, "Lviv", FlightStatus::OnTime).await;

        let changed = reconcile_city_status(&repo, &cache, "Lviv", &reading(10.0, "light rain"))
            .await
            .unwrap();

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].1, FlightStatus::Delayed);
    }

    #[tokio::test]
    async fn odesa_clear_sky_resets_manual_delay() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        seed_flight(&repo, "Odesa", FlightStatus::Delayed).await;

        let changed = reconcile_city_status(&repo, &cache, "Odesa", &reading(15.0, "clear sky"))
            .await
            .unwrap();

        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].1, FlightStatus::OnTime);
        let flights = repo.find_flights_by_origin("Odesa").await.unwrap();
        assert_eq!(flights[0].status, FlightStatus::OnTime);
    }

    #[tokio::test]
    async fn city_match_is_case_insensitive() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        seed_flight(&repo, "Kyiv", FlightStatus::OnTime).await;

        let changed = reconcile_city_status(&repo, &cache, "kYiV", &reading(-1.0, "Clear"))
            .await
            .unwrap();
        assert_eq!(changed.len(), 1);
    }

    #[tokio::test]
    async fn applying_the_same_reading_twice_is_idempotent() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        seed_flight(&repo, "Kyiv", FlightStatus::OnTime).await;

        let first = reconcile_city_status(&repo, &cache, "Kyiv", &reading(-3.0, "Clear"))
            .await
            .unwrap();
        let second = reconcile_city_status(&repo, &cache, "Kyiv", &reading(-3.0, "Clear"))
            .await
            .unwrap();

        assert_eq!(first.len(), 1);
        // Second pass changes nothing.
        assert!(second.is_empty());
        let flights = repo.find_flights_by_origin("Kyiv").await.unwrap();
        assert_eq!(flights[0].status, FlightStatus::Delayed);
    }

    #[tokio::test]
    async fn unknown_city_is_a_noop() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        let changed = reconcile_city_status(&repo, &cache, "Atlantis", &reading(-10.0, "snow"))
            .await
            .unwrap();
        assert!(changed.is_empty());
    }

    #[tokio::test]
    async fn reconcile_invalidates_cache_after_persist() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        seed_flight(&repo, "Kyiv", FlightStatus::OnTime).await;

        cache.set(repo.list_flights().await.unwrap());
        assert!(cache.get().is_some());

        reconcile_city_status(&repo, &cache, "Kyiv", &reading(-3.0, "Clear"))
            .await
            .unwrap();
        assert!(cache.get().is_none());
    }

    #[tokio::test]
    async fn noop_reconcile_leaves_cache_intact() {
        let repo = LocalRepository::new();
        let cache = FlightCache::with_defaults();
        seed_flight(&repo, "Kyiv", FlightStatus::OnTime).await;

        cache.set(repo.list_flights().await.unwrap());
        // Weather agrees with the current status; no write, no invalidation.
        reconcile_city_status(&repo, &cache, "Kyiv", &reading(15.0, "clear sky"))
            .await
            .unwrap();
        assert!(cache.get().is_some());
    }
}
