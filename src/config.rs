use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Server and engine configuration, loaded from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Seed the demo store dataset on startup so the API is explorable.
    pub seed_demo_data: bool,
    pub dedup_window_sec: u64,
    pub presence_ttl_sec: u64,
    /// Cadence at which an external driver is expected to trigger zone sweeps.
    pub auto_sweep_interval_sec: u64,
}

impl Config {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            seed_demo_data: std::env::var("SEED_DEMO_DATA")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(true),
            dedup_window_sec: env_u64("DEDUP_WINDOW_SEC", 15)?,
            presence_ttl_sec: env_u64("PRESENCE_TTL_SEC", 300)?,
            auto_sweep_interval_sec: env_u64("AUTO_SWEEP_INTERVAL_SEC", 30)?,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            dedup_window: Duration::from_secs(self.dedup_window_sec),
            presence_ttl: Duration::from_secs(self.presence_ttl_sec),
        }
    }
}

/// Time parameters the engine consults on every read and recompute.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub dedup_window: Duration,
    pub presence_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dedup_window: Duration::from_secs(15),
            presence_ttl: Duration::from_secs(300),
        }
    }
}

fn env_u64(key: &str, default: u64) -> Result<u64, std::num::ParseIntError> {
    match std::env::var(key) {
        Ok(v) => v.parse(),
        Err(_) => Ok(default),
    }
}
