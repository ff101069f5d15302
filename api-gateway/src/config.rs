//! Application configuration

use std::env;

/// Application configuration
#[allow(dead_code)]
pub struct AppConfig {
    /// API port
    pub port: u16,
    /// Database URL
    pub database_url: Option<String>,
    /// Feed cache staleness window in seconds
    pub feed_ttl_secs: i64,
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn new() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL").ok(),
            feed_ttl_secs: env::var("FEED_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
