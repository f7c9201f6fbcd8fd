//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Service configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `REQUEST_TOPIC` — inbound broker topic (default: `"conversation-requests"`)
/// - `RESPONSE_TOPIC` — outbound broker topic (default: `"conversation-responses"`)
/// - `CONSUMER_GROUP` — consumer group id (default: `"conversation-memory"`)
/// - `FETCH_BACKOFF_MS` — pause after a failed fetch (default: `1000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub request_topic: String,
    pub response_topic: String,
    pub consumer_group: String,
    pub fetch_backoff: Duration,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults. Callers pass the loaded value around; there is no global.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            request_topic: std::env::var("REQUEST_TOPIC").unwrap_or(defaults.request_topic),
            response_topic: std::env::var("RESPONSE_TOPIC").unwrap_or(defaults.response_topic),
            consumer_group: std::env::var("CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            fetch_backoff: std::env::var("FETCH_BACKOFF_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.fetch_backoff),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_topic: "conversation-requests".to_string(),
            response_topic: "conversation-responses".to_string(),
            consumer_group: "conversation-memory".to_string(),
            fetch_backoff: Duration::from_millis(1000),
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_topic, "conversation-requests");
        assert_eq!(config.fetch_backoff, Duration::from_millis(1000));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
