use anyhow::{Context, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAPS_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub maps_api_key: String,
    pub maps_base_url: String,
    pub jwt_secret: String,
    /// Applied to every outbound call to the model and maps APIs.
    pub http_timeout_secs: u64,
    pub cors_allowed_origin: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: env_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            gemini_base_url: env_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            maps_api_key: require_env("GOOGLE_MAPS_API_KEY")?,
            maps_base_url: env_or("MAPS_BASE_URL", DEFAULT_MAPS_BASE_URL),
            jwt_secret: require_env("JWT_SECRET")?,
            http_timeout_secs: env_or("HTTP_TIMEOUT_SECS", "60")
                .parse::<u64>()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN").ok(),
            port: env_or("PORT", "8000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Configuration for unit tests. Nothing here is dialled.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/planner_test".to_string(),
            gemini_api_key: "test-gemini-key".to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            maps_api_key: "test-maps-key".to_string(),
            maps_base_url: DEFAULT_MAPS_BASE_URL.to_string(),
            jwt_secret: "test-jwt-secret".to_string(),
            http_timeout_secs: 5,
            cors_allowed_origin: None,
            port: 8000,
            rust_log: "debug".to_string(),
        }
    }
}
