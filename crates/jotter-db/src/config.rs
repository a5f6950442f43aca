//! Database configuration loaded from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | required |
//! | `DB_MAX_CONNECTIONS` | 10 |
//! | `DB_MIN_CONNECTIONS` | 1 |
//! | `DB_CONNECT_TIMEOUT_SECS` | 30 |
//! | `DB_IDLE_TIMEOUT_SECS` | 600 |

use std::str::FromStr;
use std::time::Duration;

use jotter_core::{Error, Result};

use crate::pool::PoolConfig;

/// Connection settings for [`crate::Database::connect_with_config`].
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub database_url: String,
    pub pool: PoolConfig,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: PoolConfig::default(),
        }
    }

    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::Config("DATABASE_URL is not set".to_string()))?;

        let mut pool = PoolConfig::default();
        if let Some(n) = parse_var::<u32, _>(&lookup, "DB_MAX_CONNECTIONS")? {
            pool = pool.max_connections(n);
        }
        if let Some(n) = parse_var::<u32, _>(&lookup, "DB_MIN_CONNECTIONS")? {
            pool = pool.min_connections(n);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "DB_CONNECT_TIMEOUT_SECS")? {
            pool = pool.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "DB_IDLE_TIMEOUT_SECS")? {
            pool = pool.idle_timeout(Duration::from_secs(secs));
        }
        pool.validate()?;

        Ok(Self { database_url, pool })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Error::Config(format!("{} has invalid value {:?}: {}", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_requires_database_url() {
        let err = DbConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_blank_database_url_is_missing() {
        let result = DbConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_defaults_when_only_url_is_set() {
        let config =
            DbConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://localhost/notes")]))
                .unwrap();
        assert_eq!(config.database_url, "postgres://localhost/notes");
        assert_eq!(config.pool, PoolConfig::default());
    }

    #[test]
    fn test_pool_overrides() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("DB_MIN_CONNECTIONS", "2"),
            ("DB_CONNECT_TIMEOUT_SECS", " 5 "),
            ("DB_IDLE_TIMEOUT_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.pool.max_connections, 4);
        assert_eq!(config.pool.min_connections, 2);
        assert_eq!(config.pool.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.pool.idle_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_unparsable_value_is_config_error() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("DB_MAX_CONNECTIONS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_inconsistent_pool_bounds_rejected() {
        let result = DbConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/notes"),
            ("DB_MAX_CONNECTIONS", "2"),
            ("DB_MIN_CONNECTIONS", "5"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
