use serde::Serialize;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::error::ConfigError;

/// One validated, unit-converted reading from the altimeter sensor.
///
/// Built once per successful poll cycle and immutable afterwards. Pressure
/// and temperature each carry both unit representations so downstream
/// consumers never re-convert.
#[derive(Debug, Clone)]
pub struct AltimeterSample {
    pub time: OffsetDateTime,
    pub altitude_m: f64,
    pub pressure_kpa: f64,
    pub pressure_inhg: f64,
    pub temp_c: f64,
    pub temp_f: f64,
    pub status: SensorStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Online,
    Offline,
}

/// Pressure unit mode: kilopascals or inches of mercury.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureUnit {
    KiloPascals,
    InchesHg,
}

impl FromStr for PressureUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "P" => Ok(PressureUnit::KiloPascals),
            "B" => Ok(PressureUnit::InchesHg),
            other => Err(ConfigError::PressureUnit(other.to_string())),
        }
    }
}

/// Temperature unit mode: Celsius or Fahrenheit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl FromStr for TemperatureUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(TemperatureUnit::Celsius),
            "F" => Ok(TemperatureUnit::Fahrenheit),
            other => Err(ConfigError::TemperatureUnit(other.to_string())),
        }
    }
}
