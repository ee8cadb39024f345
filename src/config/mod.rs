//! Configuration module for the rental backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file holding local property records
    pub db_path: PathBuf,
    /// Path to the JSON file backing the property catalog cache
    pub cache_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Upstream booking API settings
    pub ownerrez: OwnerRezConfig,
}

/// Connection settings for the OwnerRez API.
#[derive(Debug, Clone)]
pub struct OwnerRezConfig {
    pub base_url: String,
    pub username: String,
    pub token: String,
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("RENTAL_API_PSK").ok();

        let db_path = env::var("RENTAL_DB_PATH")
            .unwrap_or_else(|_| "./data/app.sqlite".to_string())
            .into();

        let cache_path = env::var("RENTAL_CACHE_PATH")
            .unwrap_or_else(|_| "./data/property-cache.json".to_string())
            .into();

        let bind_addr = env::var("RENTAL_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid RENTAL_BIND_ADDR format: {}", e))?;

        let log_level = env::var("RENTAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timeout_secs = env::var("OWNERREZ_TIMEOUT_SECS")
            .ok()
            .map(|s| {
                s.parse::<u64>()
                    .map_err(|e| format!("Invalid OWNERREZ_TIMEOUT_SECS: {}", e))
            })
            .transpose()?
            .unwrap_or(30);

        let ownerrez = OwnerRezConfig {
            base_url: env::var("OWNERREZ_BASE_URL")
                .unwrap_or_else(|_| "https://api.ownerrez.com".to_string()),
            username: env::var("OWNERREZ_USERNAME").unwrap_or_default(),
            token: env::var("OWNERREZ_TOKEN").unwrap_or_default(),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            api_psk,
            db_path,
            cache_path,
            bind_addr,
            log_level,
            ownerrez,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("RENTAL_API_PSK");
        env::remove_var("RENTAL_DB_PATH");
        env::remove_var("RENTAL_CACHE_PATH");
        env::remove_var("RENTAL_BIND_ADDR");
        env::remove_var("RENTAL_LOG_LEVEL");
        env::remove_var("OWNERREZ_BASE_URL");
        env::remove_var("OWNERREZ_TIMEOUT_SECS");

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/app.sqlite"));
        assert_eq!(
            config.cache_path,
            PathBuf::from("./data/property-cache.json")
        );
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.ownerrez.base_url, "https://api.ownerrez.com");
        assert_eq!(config.ownerrez.timeout, Duration::from_secs(30));
    }
}
