use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub menu_seed_path: String,
    pub channel_capacity: usize,
    pub max_subscribers: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            port: try_load("RUST_PORT", "3000")?,
            database_path: try_load("DATABASE_PATH", "restaurant.db")?,
            menu_seed_path: try_load("MENU_SEED_PATH", "content/menu.json")?,
            channel_capacity: try_load("CHANNEL_CAPACITY", "64")?,
            max_subscribers: try_load("MAX_SUBSCRIBERS", "256")?,
        })
    }

    /// Throwaway database, no seed file, small channel bounds.
    pub fn in_memory() -> Self {
        Self {
            port: 0,
            database_path: ":memory:".to_string(),
            menu_seed_path: String::new(),
            channel_capacity: 16,
            max_subscribers: 16,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .map_err(|_| {
            warn!("Environment variable {key} not found, using default");
        })
        .ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value
        .parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {value}"))
}
