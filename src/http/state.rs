//! Application state for the HTTP server.

use std::sync::Arc;

use crate::clients::{AssistantProvider, WeatherProvider};
use crate::config::AppConfig;
use crate::db::repository::FullRepository;
use crate::services::flight_cache::{FlightCache, SystemClock};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for storage operations
    pub repository: Arc<dyn FullRepository>,
    /// Flight list cache, owned by this state instance
    pub flight_cache: Arc<FlightCache>,
    /// Weather provider client
    pub weather: Arc<dyn WeatherProvider>,
    /// Generative assistant client
    pub assistant: Arc<dyn AssistantProvider>,
    /// Service configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create application state; the flight cache is built from the
    /// configured expiry windows on the system clock.
    pub fn new(
        repository: Arc<dyn FullRepository>,
        weather: Arc<dyn WeatherProvider>,
        assistant: Arc<dyn AssistantProvider>,
        config: AppConfig,
    ) -> Self {
        let flight_cache = Arc::new(FlightCache::new(
            config.cache.to_cache_config(),
            Arc::new(SystemClock),
        ));
        Self {
            repository,
            flight_cache,
            weather,
            assistant,
            config: Arc::new(config),
        }
    }
}
