//! Server configuration from environment.

use chrono::{DateTime, Utc};
use interop_core::default_obstacle_epoch;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    /// Anchor from which moving obstacle travel time is measured.
    pub obstacle_epoch: DateTime<Utc>,
    pub rate_limit_enabled: bool,
    pub rate_limit_rps: u32,
    pub trust_proxy: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env_parse("INTEROP_PORT", 8000),
            database_path: env::var("INTEROP_DATABASE_PATH")
                .unwrap_or_else(|_| "data/interop.db".to_string()),
            database_max_connections: env_parse("INTEROP_DB_MAX_CONNECTIONS", 8),
            obstacle_epoch: env::var("INTEROP_OBSTACLE_EPOCH")
                .ok()
                .and_then(|value| parse_epoch(&value))
                .unwrap_or_else(default_obstacle_epoch),
            rate_limit_enabled: env_flag("INTEROP_RATE_LIMIT_ENABLED", false),
            rate_limit_rps: env_parse("INTEROP_RATE_LIMIT_RPS", 50),
            trust_proxy: env_flag("INTEROP_TRUST_PROXY", false),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn parse_epoch(value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value.trim()) {
        Ok(epoch) => Some(epoch.with_timezone(&Utc)),
        Err(err) => {
            tracing::warn!("Ignoring INTEROP_OBSTACLE_EPOCH {:?}: {}", value, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_epoch() {
        let epoch = parse_epoch("2015-06-01T12:00:00-04:00").unwrap();
        assert_eq!(epoch.to_rfc3339(), "2015-06-01T16:00:00+00:00");
        assert!(parse_epoch("yesterday").is_none());
    }
}
