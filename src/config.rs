//! Catalog configuration
//!
//! Settings for opening the catalog store. Values come from the process
//! environment, optionally seeded from a `.env` file in the working directory.
//!
//! # Environment Variables
//! - `CATALOG_DATABASE_PATH` - SQLite database file (falls back to `DATABASE_URL`)
//! - `CATALOG_MAX_CONNECTIONS` - Pool size (default 5)
//! - `CATALOG_ACQUIRE_TIMEOUT_SECS` - Wait for a pooled connection (default 30)
//! - `CATALOG_BUSY_TIMEOUT_SECS` - SQLite busy timeout (default 30)

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATABASE_FILE: &str = "catalog.db";

/// Connection settings for the catalog store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the SQLite database file (created if missing)
    pub database_path: PathBuf,
    pub max_connections: u32,
    #[serde(with = "duration_secs")]
    pub acquire_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub busy_timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

impl CatalogConfig {
    /// Build configuration with an explicit database path and default tuning
    pub fn with_path<P: Into<PathBuf>>(database_path: P) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from the environment
    ///
    /// A `.env` file is loaded first if present; variables already set in the
    /// process environment take precedence over it.
    ///
    /// # Errors
    /// Returns `Configuration` if a numeric variable cannot be parsed or the
    /// pool size is zero.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(err) if err.not_found() => {}
            Err(err) => {
                return Err(CatalogError::Configuration(format!("Failed to load .env file: {}", err)))
            }
        }

        let defaults = Self::default();

        let database_path = env_string("CATALOG_DATABASE_PATH")
            .or_else(|| env_string("DATABASE_URL").map(|url| strip_sqlite_scheme(&url)))
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let max_connections =
            env_parse::<u32>("CATALOG_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections);
        if max_connections == 0 {
            return Err(CatalogError::Configuration(
                "CATALOG_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        let acquire_timeout = env_parse::<u64>("CATALOG_ACQUIRE_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.acquire_timeout);
        let busy_timeout = env_parse::<u64>("CATALOG_BUSY_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.busy_timeout);

        Ok(Self {
            database_path,
            max_connections,
            acquire_timeout,
            busy_timeout,
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                CatalogError::Configuration(format!("Invalid value for {}: '{}' ({})", name, raw, e))
            })
        })
        .transpose()
}

/// Accept `sqlite://path`, `sqlite:path` or a bare path; query options are dropped
fn strip_sqlite_scheme(url: &str) -> String {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    rest.split('?').next().unwrap_or(rest).to_string()
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
