/// Error taxonomy for the altimeter agent
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the device driver layer.
///
/// A timeout is the only failure the poll-for-ready sequence itself can
/// produce; anything the bus transport reports is mapped into `Bus`.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor data not ready after {waited:?}")]
    Timeout { waited: Duration },
    #[error("bus transport error: {0}")]
    Bus(String),
}

/// A decoded value failed a physical plausibility check.
///
/// Each variant carries the offending value so the log line is enough to
/// diagnose a misbehaving sensor without a debugger attached.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid altitude: {0:.4e}")]
    AltitudeRange(f64),
    #[error("invalid pressure: {pressure:.4e} pDelta: {delta:.4}")]
    PressureSpike { pressure: f64, delta: f64 },
    #[error("invalid temperature: {0:.4e}")]
    TemperatureRange(f64),
}

/// A sampling cycle failed; both variants count toward the health streak.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures from the rrdtool subprocess adapter.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to run rrdtool: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("rrdtool exited with status {status}: {stderr}")]
    Tool { status: i32, stderr: String },
    #[error("database already exists: {0}")]
    Exists(PathBuf),
}

/// Invalid configuration, fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
    #[error("unrecognized pressure unit mode: {0:?} (expected P or B)")]
    PressureUnit(String),
    #[error("unrecognized temperature unit mode: {0:?} (expected C or F)")]
    TemperatureUnit(String),
}
