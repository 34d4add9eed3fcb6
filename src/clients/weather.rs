//! Weather provider client.
//!
//! Fetches current conditions by city name from an OpenWeather-style
//! API. Failures are split so operators can tell "provider down"
//! ([`WeatherError::Transport`] / [`WeatherError::Status`]) from
//! "provider changed its contract" ([`WeatherError::Malformed`] /
//! [`WeatherError::MissingField`]).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Default OpenWeather endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Weather lookup failures. None of them mutate service state.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather provider unreachable: {0}")]
    Transport(String),

    #[error("weather provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed weather payload: {0}")]
    Malformed(String),

    #[error("weather payload missing field: {0}")]
    MissingField(&'static str),
}

/// Current conditions for a city.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CurrentWeather {
    /// Temperature in °C.
    pub temperature: f64,
    /// Free-text description, e.g. "light rain". Absent when the
    /// provider omits the conditions array.
    pub description: Option<String>,
    /// Relative humidity in percent, when reported.
    pub humidity: Option<u8>,
}

/// Current-conditions lookup by city name.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_current_weather(&self, city: &str) -> Result<CurrentWeather, WeatherError>;
}

// ── OpenWeather response shape ──────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: Option<OwmMain>,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: Option<f64>,
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: Option<String>,
}

/// Parse an OpenWeather current-conditions payload.
fn parse_current(body: &str) -> Result<CurrentWeather, WeatherError> {
    let response: OwmResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Malformed(e.to_string()))?;

    let main = response.main.ok_or(WeatherError::MissingField("main"))?;
    let temperature = main.temp.ok_or(WeatherError::MissingField("main.temp"))?;
    let description = response
        .weather
        .into_iter()
        .next()
        .and_then(|c| c.description);

    Ok(CurrentWeather {
        temperature,
        description,
        humidity: main.humidity,
    })
}

/// OpenWeather API client with connection pooling and a request timeout.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build weather HTTP client");

        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_current_weather(&self, city: &str) -> Result<CurrentWeather, WeatherError> {
        let url = format!("{}/data/2.5/weather", self.base_url);

        debug!("Fetching current weather for {}", city);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| WeatherError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(WeatherError::Status {
                status,
                body: body.chars().take(500).collect(),
            });
        }

        let current = parse_current(&body)?;
        debug!(
            "Weather for {}: {:.1}°C, {:?}",
            city, current.temperature, current.description
        );
        Ok(current)
    }
}
