/// Sample acquisition and validation pipeline
use log::debug;
use time::OffsetDateTime;

use crate::error::{SampleError, ValidationError};
use crate::models::{AltimeterSample, PressureUnit, SensorStatus, TemperatureUnit};
use crate::sensor::decode::{fahrenheit_from_celsius, INHG_PER_KPA};
use crate::sensor::{Mpl3115, SensorBus};

// Physical plausibility bounds.
const MIN_VALID_ALTITUDE_M: f64 = -1000.0;
const MAX_VALID_ALTITUDE_M: f64 = 20000.0;
const MIN_VALID_TEMP_C: f64 = -40.0;
const MAX_VALID_TEMP_C: f64 = 85.0;

/// Largest cycle-to-cycle pressure change accepted as real, in kPa.
/// Filters out transient electrical noise from the pressure channel.
const MAX_ALLOWED_PRESSURE_SPIKE_KPA: f64 = 0.34;

/// Acquires one sample per cycle, validates it against physical and
/// rate-of-change bounds and derives the alternate unit representations.
///
/// The spike filter's reference value updates on every reading, including
/// rejected ones, so after a genuine step change the filter re-centers in
/// a single cycle instead of rejecting everything that follows.
pub struct SamplePipeline {
    last_pressure_kpa: f64,
}

impl SamplePipeline {
    /// `initial_pressure_kpa` seeds the spike-filter reference, normally
    /// from the pressure read taken during startup calibration.
    pub fn new(initial_pressure_kpa: f64) -> Self {
        SamplePipeline {
            last_pressure_kpa: initial_pressure_kpa,
        }
    }

    /// Run one acquisition: read all three quantities through the driver,
    /// then validate and convert. The first violation fails the cycle; no
    /// partial sample is ever produced.
    pub async fn acquire<B: SensorBus>(
        &mut self,
        sensor: &mut Mpl3115<B>,
    ) -> Result<AltimeterSample, SampleError> {
        let time = OffsetDateTime::now_utc();
        let temp_c = sensor.read_temperature(TemperatureUnit::Celsius).await?;
        let altitude_m = sensor.read_altitude().await?;
        let pressure_kpa = sensor.read_pressure(PressureUnit::KiloPascals).await?;

        debug!(
            "Altitude: {:.1} m  Pressure: {:.2} kPa  Temperature: {:.2} C",
            altitude_m, pressure_kpa, temp_c
        );

        let sample = self.validate(time, altitude_m, pressure_kpa, temp_c)?;
        Ok(sample)
    }

    /// Validate decoded values and build the sample record.
    fn validate(
        &mut self,
        time: OffsetDateTime,
        altitude_m: f64,
        pressure_kpa: f64,
        temp_c: f64,
    ) -> Result<AltimeterSample, ValidationError> {
        if !(MIN_VALID_ALTITUDE_M..=MAX_VALID_ALTITUDE_M).contains(&altitude_m) {
            return Err(ValidationError::AltitudeRange(altitude_m));
        }

        let delta = (pressure_kpa - self.last_pressure_kpa).abs();
        self.last_pressure_kpa = pressure_kpa;
        if delta > MAX_ALLOWED_PRESSURE_SPIKE_KPA {
            return Err(ValidationError::PressureSpike {
                pressure: pressure_kpa,
                delta,
            });
        }

        if !(MIN_VALID_TEMP_C..=MAX_VALID_TEMP_C).contains(&temp_c) {
            return Err(ValidationError::TemperatureRange(temp_c));
        }

        Ok(AltimeterSample {
            time,
            altitude_m,
            pressure_kpa,
            pressure_inhg: pressure_kpa * INHG_PER_KPA,
            temp_c,
            temp_f: fahrenheit_from_celsius(temp_c),
            status: SensorStatus::Online,
        })
    }
}
