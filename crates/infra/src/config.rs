//! Process configuration loaded from the environment.

use std::time::Duration;

use thiserror::Error;

use stockscope_analytics::EngineConfig;

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";
pub const ANALYTICS_QUERY_TIMEOUT_MS: &str = "ANALYTICS_QUERY_TIMEOUT_MS";
pub const LOW_STOCK_THRESHOLD: &str = "LOW_STOCK_THRESHOLD";

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings shared by the infra adapters and the report binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraConfig {
    /// Only needed by the Postgres adapter.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub query_timeout: Duration,
    /// Warehouses whose total quantity falls below this raise a low-stock alert.
    pub low_stock_threshold: i64,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
        }
    }
}

impl InfraConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_max_connections = match get(DATABASE_MAX_CONNECTIONS) {
            Some(raw) => parse_positive::<u32>(DATABASE_MAX_CONNECTIONS, &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let query_timeout_ms = match get(ANALYTICS_QUERY_TIMEOUT_MS) {
            Some(raw) => parse_positive::<u64>(ANALYTICS_QUERY_TIMEOUT_MS, &raw)?,
            None => DEFAULT_QUERY_TIMEOUT_MS,
        };
        let low_stock_threshold = match get(LOW_STOCK_THRESHOLD) {
            Some(raw) => parse::<i64>(LOW_STOCK_THRESHOLD, &raw)?,
            None => DEFAULT_LOW_STOCK_THRESHOLD,
        };

        Ok(Self {
            database_url: get(DATABASE_URL),
            database_max_connections,
            query_timeout: Duration::from_millis(query_timeout_ms),
            low_stock_threshold,
        })
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL))
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            query_timeout: self.query_timeout,
        }
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value: T = parse(key, raw)?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
