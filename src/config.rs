use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::error::{AppError, Result};

/// Tick period used when `NYE_TICK_MS` is not set
pub const DEFAULT_TICK_MS: u64 = 1000;

/// Runtime settings, read once at process start
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Database file. `None` means the per-user data directory.
    pub db_path: Option<PathBuf>,
    /// Default zone for the countdown. `None` means the system local zone.
    pub timezone: Option<String>,
    /// Default target year. `None` means next year in the chosen zone.
    pub target_year: Option<i32>,
    pub tick: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            timezone: None,
            target_year: None,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = var(&lookup, "NYE_DB_PATH").map(PathBuf::from);
        let timezone = var(&lookup, "NYE_TIMEZONE");
        let target_year = parse_opt::<i32, _>(&lookup, "NYE_TARGET_YEAR")?;
        let tick_ms = parse_opt::<u64, _>(&lookup, "NYE_TICK_MS")?.unwrap_or_else(|| {
            info!("NYE_TICK_MS not set, using default: {DEFAULT_TICK_MS}");
            DEFAULT_TICK_MS
        });
        if tick_ms == 0 {
            return Err(AppError::Config("NYE_TICK_MS must be positive".to_string()));
        }

        Ok(Self {
            db_path,
            timezone,
            target_year,
            tick: Duration::from_millis(tick_ms),
        })
    }
}

fn var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if value.is_none() {
        info!("{key} not set, using default");
    }
    value
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(lookup, key) else {
        return Ok(None);
    };
    raw.parse().map(Some).map_err(|e| {
        warn!("Invalid {key} value: {e}");
        AppError::Config(format!("invalid {key} value {raw:?}: {e}"))
    })
}
