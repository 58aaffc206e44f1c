//! Ambient, non-functional CLI configuration (log level, default search limit).
//!
//! The load-bearing storage-path resolution lives in [`crate::paths`]; this
//! module only covers cosmetic settings, loaded the same `toml` + `serde` way
//! the teacher's CLI config loader worked, resolved against `dirs::home_dir()`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_search_limit() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            default_search_limit: default_search_limit(),
        }
    }
}

impl Config {
    /// Path to the ambient config file: `~/.claude/agent-memory/config.toml`.
    pub fn config_path() -> PathBuf {
        crate::paths::memory_dir().join("config.toml")
    }

    /// Load the config file, falling back to defaults when absent or unreadable.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Persist the config to its conventional location, creating parent dirs.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        crate::paths::ensure_parent_dir(&path)?;
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(&path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let cfg = Config::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.default_search_limit, 5);
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = Config {
            log_level: "debug".to_string(),
            default_search_limit: 10,
        };
        let raw = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.log_level, "debug");
        assert_eq!(parsed.default_search_limit, 10);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.log_level, "info");
        assert_eq!(parsed.default_search_limit, 5);
    }
}
