//! Environment configuration.

use chrono::Duration;
use std::str::FromStr;
use crate::domain::shipping::ShippingPolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub port: u16,
    pub nats_url: Option<String>,
    pub jwt_secret: String,
    pub ship_after_minutes: i64,
    pub delivery_window_hours: i64,
    pub status_override_admin_only: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| lookup(name).filter(|v| !v.is_empty()).ok_or(ConfigError::Missing(name));
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET_KEY")?,
            nats_url: lookup("NATS_URL").filter(|v| !v.is_empty()),
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            port: parse_or(&lookup, "PORT", 8083)?,
            ship_after_minutes: parse_or(&lookup, "SHIP_AFTER_MINUTES", 120)?,
            delivery_window_hours: parse_or(&lookup, "DELIVERY_WINDOW_HOURS", 24)?,
            status_override_admin_only: parse_or(&lookup, "ORDER_STATUS_OVERRIDE_ADMIN_ONLY", false)?,
        })
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            ship_after: Duration::minutes(self.ship_after_minutes),
            delivery_window: Duration::hours(self.delivery_window_hours),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/shop"), ("JWT_SECRET_KEY", "s3cret")])).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.max_connections, 10);
        assert!(config.nats_url.is_none());
        assert!(!config.status_override_admin_only);
        assert_eq!(config.shipping_policy(), ShippingPolicy::default());
    }

    #[test]
    fn test_missing_and_invalid_values() {
        let err = Config::from_lookup(lookup(&[("JWT_SECRET_KEY", "s")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("JWT_SECRET_KEY", "s"), ("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.to_string(), "PORT has an invalid value: eighty");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "x"), ("JWT_SECRET_KEY", "s"), ("SHIP_AFTER_MINUTES", "30"),
            ("DELIVERY_WINDOW_HOURS", "48"), ("ORDER_STATUS_OVERRIDE_ADMIN_ONLY", "true"), ("NATS_URL", "nats://localhost:4222"),
        ])).unwrap();
        assert_eq!(config.shipping_policy().ship_after, Duration::minutes(30));
        assert_eq!(config.shipping_policy().delivery_window, Duration::hours(48));
        assert!(config.status_override_admin_only);
        assert_eq!(config.nats_url.as_deref(), Some("nats://localhost:4222"));
    }
}
