use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SidelineError;

pub const DEFAULT_EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres. None runs against the in-memory store.
    pub database_url: Option<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Push notifications
    pub expo_push_url: String,
    pub expo_access_token: Option<String>,
    pub notification_timeout: Duration,

    // Engagement
    pub earnings_rate: f64,
    pub event_bus_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, SidelineError> {
        Ok(Self {
            database_url: optional_env("DATABASE_URL"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: parsed_env("WEB_PORT", 3000)?,
            expo_push_url: env::var("EXPO_PUSH_URL")
                .unwrap_or_else(|_| DEFAULT_EXPO_PUSH_URL.to_string()),
            expo_access_token: optional_env("EXPO_ACCESS_TOKEN"),
            notification_timeout: Duration::from_millis(parsed_env(
                "NOTIFICATION_TIMEOUT_MS",
                5000,
            )?),
            earnings_rate: parsed_env("EARNINGS_RATE", 0.05)?,
            event_bus_capacity: parsed_env("EVENT_BUS_CAPACITY", 1024)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            web_host: "0.0.0.0".to_string(),
            web_port: 3000,
            expo_push_url: DEFAULT_EXPO_PUSH_URL.to_string(),
            expo_access_token: None,
            notification_timeout: Duration::from_secs(5),
            earnings_rate: 0.05,
            event_bus_capacity: 1024,
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> Result<T, SidelineError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SidelineError::Config(format!("{key} must be a number, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_env_falls_back_to_default() {
        let value: u16 = parsed_env("SIDELINE_TEST_UNSET_PORT", 3000).unwrap();
        assert_eq!(value, 3000);
    }

    #[test]
    fn parsed_env_rejects_garbage() {
        env::set_var("SIDELINE_TEST_BAD_RATE", "five percent");
        let result: Result<f64, _> = parsed_env("SIDELINE_TEST_BAD_RATE", 0.05);
        assert!(matches!(result, Err(SidelineError::Config(_))));
        env::remove_var("SIDELINE_TEST_BAD_RATE");
    }
}
