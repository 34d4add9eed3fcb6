//! Time-bounded cache for the flight list.
//!
//! A single entry holds the snapshot of all flights served by
//! `GET /flights`. The entry is valid only while BOTH clocks hold:
//! an absolute window from the time of the write, and a sliding window
//! from the last successful read. Any write that mutates flight status
//! must call [`FlightCache::invalidate`] so readers never see stale
//! status between expiries.
//!
//! The cache is owned by application state and takes its clock by
//! injection, so tests drive expiry without sleeping.
//!
//! Concurrency: the read-check-then-write sequence around a miss
//! (`get` miss → repository query → `set`) is not atomic across callers.
//! Concurrent misses may each query the store and overwrite the entry;
//! last write wins. The snapshot is pure data, so this is harmless.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::models::Flight;

/// Time source for the cache.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Expiry windows for a cache entry.
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Hard ceiling from the time of the write.
    pub absolute_ttl: Duration,
    /// Window from the last read; refreshed on every hit.
    pub sliding_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            absolute_ttl: Duration::from_secs(5 * 60),
            sliding_ttl: Duration::from_secs(2 * 60),
        }
    }
}

struct Entry {
    snapshot: Vec<Flight>,
    stored_at: Instant,
    last_access: Instant,
}

/// Single-key cache of the full flight list.
pub struct FlightCache {
    entry: RwLock<Option<Entry>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl FlightCache {
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entry: RwLock::new(None),
            config,
            clock,
        }
    }

    /// Cache with default TTLs on the system clock.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default(), Arc::new(SystemClock))
    }

    /// The cached snapshot, if present and unexpired. A hit refreshes
    /// the sliding window; an expired entry is dropped.
    pub fn get(&self) -> Option<Vec<Flight>> {
        let now = self.clock.now();
        let mut guard = self.entry.write();
        let mut entry = guard.take()?;

        let expired = now.duration_since(entry.stored_at) >= self.config.absolute_ttl
            || now.duration_since(entry.last_access) >= self.config.sliding_ttl;
        if expired {
            return None;
        }

        entry.last_access = now;
        let snapshot = entry.snapshot.clone();
        *guard = Some(entry);
        Some(snapshot)
    }

    /// Store a snapshot, replacing any earlier entry.
    pub fn set(&self, snapshot: Vec<Flight>) {
        let now = self.clock.now();
        *self.entry.write() = Some(Entry {
            snapshot,
            stored_at: now,
            last_access: now,
        });
    }

    /// Drop the entry unconditionally.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use parking_lot::Mutex;
    use uuid::Uuid;

    use crate::models::FlightStatus;

    /// Deterministic clock advanced by hand.
    struct ManualClock {
        now: Mutex<Instant>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock()
        }
    }

    fn sample_snapshot() -> Vec<Flight> {
        vec![Flight {
            id: Uuid::new_v4(),
            flight_number: "PS101".to_string(),
            origin: "Kyiv".to_string(),
            destination: "Lviv".to_string(),
            scheduled_at: Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap(),
            status: FlightStatus::OnTime,
        }]
    }

    fn cache_with_clock() -> (FlightCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let cache = FlightCache::new(CacheConfig::default(), clock.clone());
        (cache, clock)
    }

    #[test]
    fn get_returns_exact_snapshot_within_windows() {
        let (cache, clock) = cache_with_clock();
        let snapshot = sample_snapshot();
        cache.set(snapshot.clone());

        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get(), Some(snapshot));
    }

    #[test]
    fn empty_cache_misses() {
        let (cache, _clock) = cache_with_clock();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn get_after_invalidate_always_misses() {
        let (cache, _clock) = cache_with_clock();
        cache.set(sample_snapshot());
        cache.invalidate();
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn sliding_window_expires_without_access() {
        let (cache, clock) = cache_with_clock();
        cache.set(sample_snapshot());

        clock.advance(Duration::from_secs(121));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn access_refreshes_sliding_window() {
        let (cache, clock) = cache_with_clock();
        cache.set(sample_snapshot());

        // 100 s between reads keeps the sliding window alive.
        clock.advance(Duration::from_secs(100));
        assert!(cache.get().is_some());
        clock.advance(Duration::from_secs(100));
        assert!(cache.get().is_some());
    }

    #[test]
    fn absolute_ceiling_wins_over_sliding_refreshes() {
        let (cache, clock) = cache_with_clock();
        cache.set(sample_snapshot());

        // Keep touching the entry, but pass the 5 min absolute ceiling.
        for _ in 0..4 {
            clock.advance(Duration::from_secs(75));
            let _ = cache.get();
        }
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get(), None);
    }

    #[test]
    fn set_replaces_previous_entry() {
        let (cache, clock) = cache_with_clock();
        cache.set(sample_snapshot());

        clock.advance(Duration::from_secs(290));
        let fresh = sample_snapshot();
        cache.set(fresh.clone());

        // The new entry carries its own windows.
        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get(), Some(fresh));
    }

    #[test]
    fn expired_entry_is_dropped_not_resurrected() {
        let (cache, clock) = cache_with_clock();
        cache.set(sample_snapshot());

        clock.advance(Duration::from_secs(301));
        assert_eq!(cache.get(), None);
        // A second read right after must still miss.
        assert_eq!(cache.get(), None);
    }
}
