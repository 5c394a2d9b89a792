//! Application configuration loaded from environment variables.

use std::time::Duration;

use service_layer::{BusConfig, DEFAULT_STOCK_ADMIN_EMAIL};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `STOCK_ADMIN_EMAIL`: recipient of out-of-stock mails (default: `"stock-admin@made.com"`)
/// - `RETRY_MAX_ATTEMPTS`: attempts per event handler (default: `3`)
/// - `RETRY_BASE_DELAY_MS`: delay before the first retry (default: `1000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub stock_admin_email: String,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            stock_admin_email: lookup("STOCK_ADMIN_EMAIL").unwrap_or(defaults.stock_admin_email),
            retry_max_attempts: lookup("RETRY_MAX_ATTEMPTS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.retry_max_attempts),
            retry_base_delay_ms: lookup("RETRY_BASE_DELAY_MS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.retry_base_delay_ms),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the message bus settings.
    pub fn bus_config(&self) -> BusConfig {
        BusConfig::default()
            .with_retry(
                self.retry_max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            )
            .with_stock_admin_email(self.stock_admin_email.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            stock_admin_email: DEFAULT_STOCK_ADMIN_EMAIL.to_string(),
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}
