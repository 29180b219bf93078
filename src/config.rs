use crate::time::{DEFAULT_TICK_FREQUENCY, MILLISECOND_TICK_FREQUENCY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const DEFAULT_LOGGER_NAME: &str = "UNKNOWN";
const DEFAULT_LOGGER_ID: &str = "wibl-logger";

// Simulator starting state
const INITIAL_DEPTH_M: f64 = 10.0;
const INITIAL_LATITUDE_DEG: f64 = 43.0;
const INITIAL_LONGITUDE_DEG: f64 = -75.0;
const INITIAL_YEAR: i32 = 2020;

// Simulator dynamics
const DEPTH_RANDOM_WALK_M: f64 = 0.02;      // Std. dev. of depth change per update
const MEASUREMENT_UNCERTAINTY_M: f64 = 0.06; // Std. dev. of sounder noise
const POSITION_STEP_DEG: f64 = 3.2708e-06;   // Roughly 0.36 m per second at 43N
const DEFAULT_SEED: u64 = 0x1234_5678_9ABC_DEF0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identification recorded in the metadata (and optional setup) packets of each log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggerIdentity {
    pub name: String,
    pub identifier: String,
    #[serde(default)]
    pub setup: Option<serde_json::Value>,
}

impl Default for LoggerIdentity {
    fn default() -> Self {
        Self {
            name: DEFAULT_LOGGER_NAME.to_string(),
            identifier: DEFAULT_LOGGER_ID.to_string(),
            setup: None,
        }
    }
}

/// Which protocol renderings the simulator writes for each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputProtocols {
    pub nmea0183: bool,
    pub nmea2000: bool,
}

impl Default for OutputProtocols {
    fn default() -> Self {
        Self {
            nmea0183: true,
            nmea2000: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub tick_frequency: u64,
    pub initial_depth_m: f64,
    pub initial_latitude_deg: f64,
    pub initial_longitude_deg: f64,
    pub initial_year: i32,
    pub depth_random_walk_m: f64,
    pub measurement_uncertainty_m: f64,
    pub position_step_deg: f64,
    pub protocols: OutputProtocols,
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_frequency: DEFAULT_TICK_FREQUENCY,
            initial_depth_m: INITIAL_DEPTH_M,
            initial_latitude_deg: INITIAL_LATITUDE_DEG,
            initial_longitude_deg: INITIAL_LONGITUDE_DEG,
            initial_year: INITIAL_YEAR,
            depth_random_walk_m: DEPTH_RANDOM_WALK_M,
            measurement_uncertainty_m: MEASUREMENT_UNCERTAINTY_M,
            position_step_deg: POSITION_STEP_DEG,
            protocols: OutputProtocols::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulatorConfig {
    /// Settings for a host whose tick source counts milliseconds.
    pub fn millisecond_ticks() -> Self {
        Self {
            tick_frequency: MILLISECOND_TICK_FREQUENCY,
            ..Self::default()
        }
    }
}

/// Top-level configuration file: simulator settings plus logger identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub identity: LoggerIdentity,
    pub simulator: SimulatorConfig,
}

impl LoggerConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = LoggerConfig::from_json_str(
            r#"{"identity":{"name":"Mystic","identifier":"UNH-0001"},"simulator":{"seed":7}}"#,
        )
        .unwrap();

        assert_eq!(config.identity.name, "Mystic");
        assert!(config.identity.setup.is_none());
        assert_eq!(config.simulator.seed, 7);
        assert_eq!(config.simulator.initial_depth_m, INITIAL_DEPTH_M);
        assert!(config.simulator.protocols.nmea0183);
    }

    #[test]
    fn test_invalid_json_rejected() {
        let result = LoggerConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }
}
