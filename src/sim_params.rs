use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// Raw simulation inputs as delivered by the host. Validated and discretized by
// `SimulationConfig::from_params`; they don't change at runtime.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct SimParams {
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Wind direction in degrees, any range.
    pub wind_direction: f64,
    /// Particulate matter index, selects the initial particle count.
    pub pm10: f64,

    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub domain: DomainParams,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DomainParams {
    pub x: [f32; 2],
    pub y: [f32; 2],
    pub z: [f32; 2],
}

impl Default for DomainParams {
    fn default() -> Self {
        DomainParams {
            x: [-500.0, 500.0],
            y: [-200.0, 200.0],
            z: [-500.0, 500.0],
        }
    }
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            wind_speed: 5.0,
            wind_direction: 45.0,
            pm10: 50.0,
            seed: None,
            domain: DomainParams::default(),
        }
    }
}

impl std::str::FromStr for SimParams {
    type Err = toml::de::Error;
    fn from_str(serialized: &str) -> Result<Self, Self::Err> {
        let params = toml::from_str(serialized)?;
        Ok(params)
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::NotANumber {
            name,
            value: value.to_string(),
        })
}

impl SimParams {
    pub fn read_from_file(path: &str) -> anyhow::Result<SimParams> {
        let params = std::fs::read_to_string(path)?.parse()?;
        Ok(params)
    }

    /// Loads `path`, falling back to defaults when the file is missing or
    /// malformed.
    pub fn from_file_or_default(path: &str) -> SimParams {
        match SimParams::read_from_file(path) {
            Ok(params) => params,
            Err(e) => {
                log::error!("Failed to parse config file({}): {:?}", path, e);
                SimParams::default()
            }
        }
    }

    /// Overrides file values with raw string inputs, e.g. from command line
    /// flags.
    pub fn apply_overrides(
        &mut self,
        wind_speed: Option<&str>,
        wind_direction: Option<&str>,
        pm10: Option<&str>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = wind_speed {
            self.wind_speed = parse_number("wind_speed", value)?;
        }
        if let Some(value) = wind_direction {
            self.wind_direction = parse_number("wind_direction", value)?;
        }
        if let Some(value) = pm10 {
            self.pm10 = parse_number("pm10", value)?;
        }
        Ok(())
    }
}
