use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

use crate::error::{MetricsError, Result};

pub const DEFAULT_CACHE_PATH: &str = ".dashboard-cache.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub cache_path: PathBuf,
    pub max_connections: u32,
    pub offline: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            cache_path: PathBuf::from(try_load::<String>(
                "DASHBOARD_CACHE_PATH",
                DEFAULT_CACHE_PATH,
            )?),
            max_connections: try_load("DASHBOARD_MAX_CONNECTIONS", "5")?,
            offline: false,
        })
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = self.offline || offline;
        self
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        MetricsError::InvalidConfiguration(format!("{key}={raw}: {e}"))
    })
}
