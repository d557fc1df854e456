//! Engine configuration

use crate::error::EngineError;
use ::config::{Config, Environment, File};
use line_buffer::{DEFAULT_CAPACITY, MIN_CAPACITY};
use serde::{Deserialize, Serialize};
use snapshot::DEFAULT_MAX_RETRIES;
use std::path::Path;
use std::time::Duration;

/// Longest accepted line buffer
const MAX_LINE_CAPACITY: usize = 4096;

/// Longest accepted tick interval
const MAX_TICK_INTERVAL_MS: u64 = 1000;

/// Environment variable prefix for overrides (`GPS_ENGINE_TICK_INTERVAL_MS`)
const ENV_PREFIX: &str = "GPS_ENGINE";

/// Pulse signal edge that marks the start of a second
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PpsEdge {
    #[default]
    Rising,
    Falling,
}

/// GPS engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tick cadence in milliseconds; a multiple of 10
    pub tick_interval_ms: u64,

    /// Capacity of each line buffer in bytes
    pub line_capacity: usize,

    /// Pulse edge polarity used when a pulse source is attached
    pub pps_edge: PpsEdge,

    /// Read attempts before a snapshot read is reported as starved
    pub max_snapshot_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
            line_capacity: DEFAULT_CAPACITY,
            pps_edge: PpsEdge::Rising,
            max_snapshot_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl EngineConfig {
    /// Slower tick for battery-powered loggers
    pub fn low_power() -> Self {
        Self {
            tick_interval_ms: 50,
            max_snapshot_retries: 16,
            ..Default::default()
        }
    }

    /// Longer lines for receivers emitting proprietary sentences
    pub fn long_lines() -> Self {
        Self {
            line_capacity: 256,
            ..Default::default()
        }
    }

    /// Load from an optional file plus `GPS_ENGINE_*` environment overrides.
    ///
    /// A missing file is not an error; every absent key keeps its default.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the engine cannot run with
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tick_interval_ms == 0 || self.tick_interval_ms % 10 != 0 {
            return Err(EngineError::InvalidConfig(format!(
                "tick_interval_ms must be a positive multiple of 10, got {}",
                self.tick_interval_ms
            )));
        }
        if self.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(EngineError::InvalidConfig(format!(
                "tick_interval_ms must be at most {}, got {}",
                MAX_TICK_INTERVAL_MS, self.tick_interval_ms
            )));
        }
        if !(MIN_CAPACITY..=MAX_LINE_CAPACITY).contains(&self.line_capacity) {
            return Err(EngineError::InvalidConfig(format!(
                "line_capacity must be in [{}, {}], got {}",
                MIN_CAPACITY, MAX_LINE_CAPACITY, self.line_capacity
            )));
        }
        if self.max_snapshot_retries == 0 {
            return Err(EngineError::InvalidConfig(
                "max_snapshot_retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Tick cadence as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Centiseconds the clock advances per tick
    pub fn centiseconds_per_tick(&self) -> u32 {
        (self.tick_interval_ms / 10) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.centiseconds_per_tick(), 1);
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
        assert_eq!(config.line_capacity, 128);
        assert_eq!(config.max_snapshot_retries, 64);
    }

    #[test]
    fn test_presets() {
        let low_power = EngineConfig::low_power();
        assert!(low_power.validate().is_ok());
        assert_eq!(low_power.centiseconds_per_tick(), 5);
        assert!(EngineConfig::long_lines().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            EngineConfig {
                tick_interval_ms: 15,
                ..Default::default()
            },
            EngineConfig {
                tick_interval_ms: 0,
                ..Default::default()
            },
            EngineConfig {
                tick_interval_ms: 2000,
                ..Default::default()
            },
            EngineConfig {
                line_capacity: 8,
                ..Default::default()
            },
            EngineConfig {
                max_snapshot_retries: 0,
                ..Default::default()
            },
        ];
        for config in cases {
            assert!(
                matches!(config.validate(), Err(EngineError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "tick_interval_ms": 20, "pps_edge": "falling" }"#).unwrap();
        assert_eq!(config.tick_interval_ms, 20);
        assert_eq!(config.pps_edge, PpsEdge::Falling);
        assert_eq!(config.line_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("gps-engine-{}.toml", std::process::id()));
        std::fs::write(&path, "tick_interval_ms = 40\nline_capacity = 200\npps_edge = \"falling\"\n")
            .unwrap();

        let config = EngineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.tick_interval_ms, 40);
        assert_eq!(config.line_capacity, 200);
        assert_eq!(config.pps_edge, PpsEdge::Falling);
        assert_eq!(config.max_snapshot_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("gps-engine-does-not-exist.toml");
        let config = EngineConfig::load(path).unwrap();
        assert_eq!(config.tick_interval_ms, 10);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path = std::env::temp_dir().join(format!("gps-engine-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "tick_interval_ms = 25\n").unwrap();
        let result = EngineConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }
}
