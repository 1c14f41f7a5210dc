//! API configuration.

use std::time::Duration;

/// Where documents are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Firestore over REST (production).
    Firestore,
    /// Process-local store for development.
    Memory,
}

impl StoreBackend {
    fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Self::Memory,
            _ => Self::Firestore,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second
    pub rate_limit_rps: u32,
    /// Rate limit burst
    pub rate_limit_burst: u32,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Deadline applied to every store call made by a service
    pub store_timeout: Duration,
    /// Largest accepted avatar upload
    pub avatar_max_bytes: usize,
    pub store_backend: StoreBackend,
    /// Periodic deletion of expired jobs
    pub expiry_sweep_enabled: bool,
    pub expiry_sweep_interval: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            store_timeout: Duration::from_secs(5),
            avatar_max_bytes: 5 * 1024 * 1024,
            store_backend: StoreBackend::Firestore,
            expiry_sweep_enabled: false,
            expiry_sweep_interval: Duration::from_secs(3600),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST").unwrap_or(defaults.rate_limit_burst),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            store_timeout: env_parse("STORE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.store_timeout),
            avatar_max_bytes: env_parse("AVATAR_MAX_BYTES").unwrap_or(defaults.avatar_max_bytes),
            store_backend: std::env::var("STORE_BACKEND")
                .map(|s| StoreBackend::parse(&s))
                .unwrap_or(defaults.store_backend),
            expiry_sweep_enabled: env_flag("EXPIRY_SWEEP_ENABLED")
                .unwrap_or(defaults.expiry_sweep_enabled),
            expiry_sweep_interval: env_parse("EXPIRY_SWEEP_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.expiry_sweep_interval),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "API_PORT",
        "CORS_ORIGINS",
        "STORE_TIMEOUT_SECS",
        "STORE_BACKEND",
        "EXPIRY_SWEEP_ENABLED",
        "AVATAR_MAX_BYTES",
    ];

    fn clear() {
        for v in VARS {
            std::env::remove_var(v);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8000);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.avatar_max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.store_backend, StoreBackend::Firestore);
        assert!(!config.expiry_sweep_enabled);
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        std::env::set_var("API_PORT", "9100");
        std::env::set_var("CORS_ORIGINS", "https://employer.career4me.test, ,http://localhost:3000");
        std::env::set_var("STORE_TIMEOUT_SECS", "2");
        std::env::set_var("STORE_BACKEND", "memory");
        std::env::set_var("EXPIRY_SWEEP_ENABLED", "true");

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 9100);
        assert_eq!(config.cors_origins.len(), 2);
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.expiry_sweep_enabled);
        clear();
    }
}
