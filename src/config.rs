use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::PressureUnit;

// Reference deployment intervals (seconds).
const DEFAULT_SAMPLE_INTERVAL_SECS: u64 = 5;
const DEFAULT_DB_UPDATE_INTERVAL_SECS: u64 = 30;
const DEFAULT_CHART_UPDATE_INTERVAL_SECS: u64 = 300;

const DEFAULT_SENSOR_ADDR: u16 = 0x60;

/// Agent configuration assembled from the environment.
///
/// Every setting has a default derived from the reference deployment (paths
/// under `$HOME`, bus 1, sensor address 0x60) and may be overridden through
/// an `ALTIMETER_*` environment variable or a `.env` file. Malformed values
/// are fatal at startup rather than silently defaulted.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Directory the generated charts are written to.
    pub charts_dir: PathBuf,
    /// JSON data file served to html clients.
    pub output_data_file: PathBuf,
    /// rrdtool database file.
    pub rrd_file: PathBuf,
    /// Altimeter reset signal file, created by user action.
    pub reset_file: PathBuf,
    /// I2C device node the sensor is attached to.
    pub i2c_device: PathBuf,
    /// Sensor slave address on the bus.
    pub sensor_address: u16,
    /// Unit mode used when writing the barometric calibration offset.
    pub calibration_unit: PressureUnit,
    pub sample_interval: Duration,
    pub db_update_interval: Duration,
    pub chart_interval: Duration,
}

impl AgentConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        let home = env::var("HOME").map_err(|_| ConfigError::Missing("HOME"))?;
        let docroot = env::var("ALTIMETER_DOCROOT")
            .unwrap_or_else(|_| format!("{}/public_html/altimeter", home));

        let charts_dir = env::var("ALTIMETER_CHARTS_DIR")
            .unwrap_or_else(|_| format!("{}/dynamic", docroot));
        let output_data_file = env::var("ALTIMETER_DATA_FILE")
            .unwrap_or_else(|_| format!("{}/dynamic/altimeterData.js", docroot));
        let rrd_file = env::var("ALTIMETER_RRD_FILE")
            .unwrap_or_else(|_| format!("{}/database/altimeterData.rrd", home));
        let reset_file = env::var("ALTIMETER_RESET_FILE")
            .unwrap_or_else(|_| "/tmp/altimeter/resetAltimeter".to_string());
        let i2c_device = env::var("ALTIMETER_I2C_DEVICE")
            .unwrap_or_else(|_| "/dev/i2c-1".to_string());

        let sensor_address = match env::var("ALTIMETER_SENSOR_ADDR") {
            Ok(value) => parse_address("ALTIMETER_SENSOR_ADDR", &value)?,
            Err(_) => DEFAULT_SENSOR_ADDR,
        };

        let calibration_unit = match env::var("ALTIMETER_CALIBRATION_UNIT") {
            Ok(value) => value.parse()?,
            Err(_) => PressureUnit::InchesHg,
        };

        Ok(AgentConfig {
            charts_dir: charts_dir.into(),
            output_data_file: output_data_file.into(),
            rrd_file: rrd_file.into(),
            reset_file: reset_file.into(),
            i2c_device: i2c_device.into(),
            sensor_address,
            calibration_unit,
            sample_interval: interval_from_env(
                "ALTIMETER_POLL_INTERVAL",
                DEFAULT_SAMPLE_INTERVAL_SECS,
            )?,
            db_update_interval: interval_from_env(
                "ALTIMETER_DB_INTERVAL",
                DEFAULT_DB_UPDATE_INTERVAL_SECS,
            )?,
            chart_interval: interval_from_env(
                "ALTIMETER_CHART_INTERVAL",
                DEFAULT_CHART_UPDATE_INTERVAL_SECS,
            )?,
        })
    }
}

/// Parse a bus address given either as decimal or with a `0x` prefix.
fn parse_address(key: &str, value: &str) -> Result<u16, ConfigError> {
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn interval_from_env(key: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    let secs = match env::var(key) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        })?,
        Err(_) => default_secs,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parses_hex_and_decimal() {
        assert_eq!(parse_address("A", "0x60").unwrap(), 0x60);
        assert_eq!(parse_address("A", "0X60").unwrap(), 0x60);
        assert_eq!(parse_address("A", "96").unwrap(), 96);
    }

    #[test]
    fn bad_address_is_an_error() {
        assert!(parse_address("A", "sixty").is_err());
        assert!(parse_address("A", "0xZZ").is_err());
    }
}
