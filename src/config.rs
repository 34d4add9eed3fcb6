//! Application configuration — defaults, optional `config.toml`, and
//! environment variable overrides (highest priority).

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::services::flight_cache::CacheConfig;

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// OpenWeather API key.
    pub openweather_api_key: String,
    /// Gemini API key for the chat assistant.
    pub gemini_api_key: String,
    /// Shared secret for payment webhook signatures.
    pub webhook_secret: String,
    /// Token issuing/validation settings.
    pub auth: AuthConfig,
    /// Flight cache expiry windows.
    pub cache: CacheSettings,
}

/// JWT settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret.
    pub jwt_secret: String,
    /// Expected `iss` claim.
    pub issuer: String,
    /// Expected `aud` claim.
    pub audience: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
}

/// Flight cache expiry windows (seconds).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub absolute_ttl_secs: u64,
    pub sliding_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            openweather_api_key: String::new(),
            gemini_api_key: String::new(),
            webhook_secret: String::new(),
            auth: AuthConfig::default(),
            cache: CacheSettings::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: "airport-api".to_string(),
            audience: "airport-frontend".to_string(),
            token_ttl_secs: 3600,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            absolute_ttl_secs: 300,
            sliding_ttl_secs: 120,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            absolute_ttl: Duration::from_secs(self.absolute_ttl_secs),
            sliding_ttl: Duration::from_secs(self.sliding_ttl_secs),
        }
    }
}

fn validate(config: &AppConfig) -> Result<(), String> {
    let mut issues: Vec<String> = Vec::new();

    if config.cache.absolute_ttl_secs == 0 {
        issues.push("cache.absolute_ttl_secs must be > 0".into());
    }
    if config.cache.sliding_ttl_secs == 0 {
        issues.push("cache.sliding_ttl_secs must be > 0".into());
    }
    if config.cache.sliding_ttl_secs > config.cache.absolute_ttl_secs {
        issues.push("cache.sliding_ttl_secs must not exceed cache.absolute_ttl_secs".into());
    }
    if config.auth.token_ttl_secs == 0 {
        issues.push("auth.token_ttl_secs must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(format!("Invalid config:\n - {}", issues.join("\n - ")))
    }
}

impl AppConfig {
    /// Load configuration: defaults, then `config.toml` when present,
    /// then environment variables.
    pub fn load() -> Result<Self, String> {
        let mut config = AppConfig::default();

        let config_path = Path::new("config.toml");
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| format!("Failed to read config.toml: {}", e))?;
            config = toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse config.toml: {}", e))?;
        }

        if let Ok(host) = std::env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .trim()
                .parse()
                .map_err(|_| "PORT must be a valid port number".to_string())?;
        }
        if let Ok(key) = std::env::var("OPENWEATHER_API_KEY") {
            config.openweather_api_key = key;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            config.gemini_api_key = key;
        }
        if let Ok(secret) = std::env::var("STRIPE_WEBHOOK_SECRET") {
            config.webhook_secret = secret;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.auth.jwt_secret = secret;
        }
        if let Ok(issuer) = std::env::var("JWT_ISSUER") {
            config.auth.issuer = issuer;
        }
        if let Ok(audience) = std::env::var("JWT_AUDIENCE") {
            config.auth.audience = audience;
        }
        if let Ok(ttl) = std::env::var("CACHE_ABSOLUTE_TTL_SECS") {
            config.cache.absolute_ttl_secs = ttl
                .trim()
                .parse()
                .map_err(|_| "CACHE_ABSOLUTE_TTL_SECS must be an integer".to_string())?;
        }
        if let Ok(ttl) = std::env::var("CACHE_SLIDING_TTL_SECS") {
            config.cache.sliding_ttl_secs = ttl
                .trim()
                .parse()
                .map_err(|_| "CACHE_SLIDING_TTL_SECS must be an integer".to_string())?;
        }

        if config.auth.jwt_secret.is_empty() {
            warn!("JWT_SECRET not set; tokens will not survive restarts securely");
        }
        if config.openweather_api_key.is_empty() {
            warn!("OPENWEATHER_API_KEY not set; weather lookups will fail");
        }
        if config.webhook_secret.is_empty() {
            warn!("STRIPE_WEBHOOK_SECRET not set; webhook deliveries will be rejected");
        }

        validate(&config)?;
        Ok(config)
    }
}
