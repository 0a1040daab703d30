//! Engine configuration.
//!
//! Loaded from an optional `config/engine.toml` file layered with
//! `HOTEL_`-prefixed environment variables (e.g. `HOTEL_AUTO_LOCK_SECS=10`).

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Delay before an unlocked door is re-locked automatically.
    #[serde(default = "default_auto_lock_secs")]
    pub auto_lock_secs: u64,

    /// Capacity of the store change-feed channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Log filter used when the `RUST_LOG` variable is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_auto_lock_secs() -> u64 {
    30
}

fn default_event_capacity() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl EngineConfig {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        config::Config::builder()
            .add_source(config::File::with_name("config/engine").required(false))
            .add_source(config::Environment::with_prefix("HOTEL"))
            .build()?
            .try_deserialize()
    }

    pub fn auto_lock_delay(&self) -> Duration {
        Duration::from_secs(self.auto_lock_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_lock_secs: default_auto_lock_secs(),
            event_capacity: default_event_capacity(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}
