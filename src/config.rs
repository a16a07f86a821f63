//! Application configuration loaded from environment variables.
//!
//! Read once at startup. A `.env` file is honored for local development.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default number of concurrent enrichment tasks per ranking request.
pub const DEFAULT_RANKING_CONCURRENCY: usize = 10;
/// Default deadline for all enrichment tasks of one ranking request.
pub const DEFAULT_ENRICHMENT_TIMEOUT_MS: u64 = 2000;

/// Which store backend to open at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process maps (single instance, non-durable)
    Memory,
    /// Google Firestore
    Firestore,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "firestore" => Ok(StoreBackend::Firestore),
            other => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: other.to_string(),
            }),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Store backend
    pub store_backend: StoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: Option<String>,
    /// Max concurrent enrichment tasks per ranking request
    pub ranking_concurrency: usize,
    /// Deadline for the enrichment of one ranking request
    pub enrichment_timeout: Duration,
    /// Bearer token for admin routes; admin routes are disabled when unset
    pub admin_token: Option<String>,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            frontend_url: "http://localhost:5173".to_string(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: None,
            ranking_concurrency: DEFAULT_RANKING_CONCURRENCY,
            enrichment_timeout: Duration::from_millis(DEFAULT_ENRICHMENT_TIMEOUT_MS),
            admin_token: Some("test_admin_token".to_string()),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Memory,
        };

        let gcp_project_id = non_empty_var("GCP_PROJECT_ID");
        if store_backend == StoreBackend::Firestore && gcp_project_id.is_none() {
            return Err(ConfigError::Missing("GCP_PROJECT_ID"));
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            store_backend,
            gcp_project_id,
            ranking_concurrency: env::var("RANKING_CONCURRENCY")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(DEFAULT_RANKING_CONCURRENCY)
                .max(1),
            enrichment_timeout: Duration::from_millis(
                env::var("ENRICHMENT_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_ENRICHMENT_TIMEOUT_MS),
            ),
            admin_token: non_empty_var("ADMIN_TOKEN"),
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(
            "memory".parse::<StoreBackend>().unwrap(),
            StoreBackend::Memory
        );
        assert_eq!(
            " Firestore ".parse::<StoreBackend>().unwrap(),
            StoreBackend::Firestore
        );
        assert!(matches!(
            "mongo".parse::<StoreBackend>(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_config_from_env() {
        // Set env vars for test
        env::set_var("STORE_BACKEND", "memory");
        env::set_var("RANKING_CONCURRENCY", "0");
        env::set_var("ENRICHMENT_TIMEOUT_MS", "500");
        env::set_var("ADMIN_TOKEN", "  ");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.ranking_concurrency, 1);
        assert_eq!(config.enrichment_timeout, Duration::from_millis(500));
        assert_eq!(config.admin_token, None);
    }
}
