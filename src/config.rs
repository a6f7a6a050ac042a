//! Runtime configuration read from the environment (and `.env` via dotenvy).

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server and quote settings
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub route_cache_ttl: Duration,
    pub route_cache_capacity: u64,
    /// Multiplier from great-circle to road distance
    pub road_factor: f64,
    pub notification_cooldown: chrono::Duration,
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            route_cache_ttl: Duration::from_secs(600),
            route_cache_capacity: 1000,
            road_factor: 1.3,
            notification_cooldown: chrono::Duration::milliseconds(
                crate::notifications::DEFAULT_COOLDOWN_MS,
            ),
            currency: "MXN".to_string(),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}

impl Config {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let road_factor: f64 = parse_var(&lookup, "ROAD_FACTOR", defaults.road_factor)?;
        if !road_factor.is_finite() || road_factor < 1.0 {
            anyhow::bail!("ROAD_FACTOR must be a finite number >= 1.0, got {}", road_factor);
        }

        let cooldown_ms: i64 = parse_var(
            &lookup,
            "NOTIFICATION_COOLDOWN_MS",
            defaults.notification_cooldown.num_milliseconds(),
        )?;
        if cooldown_ms < 0 {
            anyhow::bail!("NOTIFICATION_COOLDOWN_MS must not be negative");
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            route_cache_ttl: Duration::from_secs(parse_var(
                &lookup,
                "ROUTE_CACHE_TTL_SECS",
                defaults.route_cache_ttl.as_secs(),
            )?),
            route_cache_capacity: parse_var(
                &lookup,
                "ROUTE_CACHE_CAPACITY",
                defaults.route_cache_capacity,
            )?,
            road_factor,
            notification_cooldown: chrono::Duration::milliseconds(cooldown_ms),
            currency: lookup("CURRENCY").unwrap_or(defaults.currency),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
