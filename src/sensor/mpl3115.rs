/// Device driver for the MPL3115A2 altimeter/barometer sensor
///
/// A full 5-byte frame must be read from the output registers on every
/// acquisition, three bytes of pressure/altitude plus two of temperature.
/// Anything less leaves stale data in the registers for the next cycle.
use log::{debug, trace};
use tokio::time::{sleep, Duration, Instant};

use crate::error::SensorError;
use crate::models::{PressureUnit, TemperatureUnit};
use crate::sensor::bus::SensorBus;
use crate::sensor::decode;

// Device registers.
pub(crate) const STATUS_REG: u8 = 0x00;
const OUT_P_MSB_REG: u8 = 0x01;
const ID_REG: u8 = 0x0C;
const PT_DATA_CFG_REG: u8 = 0x13;
const BAR_IN_MSB_REG: u8 = 0x14;
const CTRL_REG_1: u8 = 0x26;

// STATUS register bit indicating pressure/temperature data ready.
const PTDR_BIT: u8 = 0x08;

/// Wall-clock budget for one poll-for-ready sequence.
const SENSOR_READ_TIMEOUT: Duration = Duration::from_secs(2);
/// Sub-interval between status-register polls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default sensor configuration, written to CTRL_REG1.
///
///               10111000 0xB8
///   |      10        |  111   |      000     |
///   | altimeter mode | OSR128 | standby mode |
const DEFAULT_CONFIG: u8 = 0xB8;

/// Measurement mode selected in CTRL_REG1 before each read.
#[derive(Debug, Clone, Copy)]
enum MeasureMode {
    Altimeter,
    Barometer,
}

/// Driver for one MPL3115A2 on a register-addressed bus.
pub struct Mpl3115<B: SensorBus> {
    bus: B,
    config: u8,
}

impl<B: SensorBus> Mpl3115<B> {
    /// Initialize the sensor: place it in standby with the default
    /// configuration word and enable data-ready event flags.
    pub fn new(bus: B) -> Result<Self, SensorError> {
        Self::with_config(bus, DEFAULT_CONFIG)
    }

    pub fn with_config(mut bus: B, config: u8) -> Result<Self, SensorError> {
        bus.write_byte(CTRL_REG_1, config & 0xFE)?;

        // Data configuration register PT_DATA_CFG:
        //            00000111 0x07
        //   | 00000 |  1   |   1   |   1   |
        //   |   X   | DREM | PDEFE | TDEFE |
        // data-ready event mode, pressure/altitude and temperature flags
        bus.write_byte(PT_DATA_CFG_REG, 0x07)?;

        Ok(Mpl3115 { bus, config })
    }

    /// Read the WHO_AM_I, status and control registers for startup logging.
    pub fn device_info(&mut self) -> Result<(u8, u8, u8), SensorError> {
        let id = self.bus.read_byte(ID_REG)?;
        let status = self.bus.read_byte(STATUS_REG)?;
        let control = self.bus.read_byte(CTRL_REG_1)?;
        Ok((id, status, control))
    }

    /// Read altitude in meters.
    pub async fn read_altitude(&mut self) -> Result<f64, SensorError> {
        let frame = self.acquire_frame(MeasureMode::Altimeter).await?;
        Ok(decode::altitude_m(&frame))
    }

    /// Read pressure in the requested unit.
    pub async fn read_pressure(&mut self, unit: PressureUnit) -> Result<f64, SensorError> {
        let frame = self.acquire_frame(MeasureMode::Barometer).await?;
        let pascals = decode::pressure_pa(&frame);
        Ok(match unit {
            PressureUnit::KiloPascals => pascals / 1000.0,
            PressureUnit::InchesHg => pascals / decode::PA_PER_INHG,
        })
    }

    /// Read temperature in the requested unit.
    pub async fn read_temperature(&mut self, unit: TemperatureUnit) -> Result<f64, SensorError> {
        let frame = self.acquire_frame(MeasureMode::Altimeter).await?;
        let celsius = decode::temperature_c(&frame);
        Ok(match unit {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => decode::fahrenheit_from_celsius(celsius),
        })
    }

    /// Write the barometric offset used to zero the altimeter.
    pub fn set_pressure_offset(
        &mut self,
        offset: f64,
        unit: PressureUnit,
    ) -> Result<(), SensorError> {
        let image = decode::encode_pressure_offset(offset, unit);
        trace!("pressure offset register: {:08b} {:08b}", image[0], image[1]);
        self.bus.write_block(BAR_IN_MSB_REG, &image)
    }

    /// Select the measurement mode, wait for data ready and read one frame.
    async fn acquire_frame(&mut self, mode: MeasureMode) -> Result<[u8; 5], SensorError> {
        self.select_mode(mode)?;
        self.poll_for_data().await?;

        let block = self.bus.read_block(OUT_P_MSB_REG, 5)?;
        let frame: [u8; 5] = block
            .try_into()
            .map_err(|b: Vec<u8>| SensorError::Bus(format!("short read: {} bytes", b.len())))?;
        trace!(
            "output registers: {:08b} {:08b} {:08b} {:08b} {:08b}",
            frame[0],
            frame[1],
            frame[2],
            frame[3],
            frame[4]
        );
        Ok(frame)
    }

    /// Write the mode-select byte to CTRL_REG1, preserving the unrelated
    /// configuration bits.
    ///
    /// Altimeter:            10111001 0xB9
    ///   |      10        |  111   |      001    |
    ///   | altimeter mode | OSR128 | active mode |
    ///
    /// Barometer:            00111001 0x39
    ///   |      00        |  111   |      001    |
    ///   | barometer mode | OSR128 | active mode |
    fn select_mode(&mut self, mode: MeasureMode) -> Result<(), SensorError> {
        let word = match mode {
            MeasureMode::Altimeter => self.config | 0x01,
            MeasureMode::Barometer => self.config & 0x3F | 0x01,
        };
        self.bus.write_byte(CTRL_REG_1, word)
    }

    /// Poll the status register until the data-ready bit sets or the
    /// timeout budget elapses. Bounded: a dead device costs at most the
    /// budget, never an indefinite hang.
    async fn poll_for_data(&mut self) -> Result<(), SensorError> {
        let start = Instant::now();
        while start.elapsed() < SENSOR_READ_TIMEOUT {
            let status = self.bus.read_byte(STATUS_REG)?;
            if status & PTDR_BIT != 0 {
                debug!("sensor ready after {:?}", start.elapsed());
                // Settle for one extra sub-interval before reading the
                // output registers.
                sleep(POLL_INTERVAL).await;
                return Ok(());
            }
            sleep(POLL_INTERVAL).await;
        }
        Err(SensorError::Timeout {
            waited: start.elapsed(),
        })
    }
}
