/// Register-addressed bus transport for the altimeter sensor
use std::path::Path;

use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;

use crate::error::SensorError;

/// Byte-level register access to a single bus slave.
///
/// The slave address is bound at construction; the driver above this trait
/// only ever talks to one device. Implementations map their transport
/// failures into `SensorError::Bus`.
pub trait SensorBus {
    fn read_byte(&mut self, register: u8) -> Result<u8, SensorError>;
    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), SensorError>;
    fn read_block(&mut self, register: u8, len: u8) -> Result<Vec<u8>, SensorError>;
    fn write_block(&mut self, register: u8, values: &[u8]) -> Result<(), SensorError>;
}

/// SMBus transport over a Linux `/dev/i2c-*` device node.
pub struct LinuxSensorBus {
    device: LinuxI2CDevice,
}

impl LinuxSensorBus {
    /// Open the device node and bind the sensor's slave address.
    pub fn open(path: &Path, slave_address: u16) -> Result<Self, SensorError> {
        let device = LinuxI2CDevice::new(path, slave_address)
            .map_err(|e| SensorError::Bus(e.to_string()))?;
        Ok(LinuxSensorBus { device })
    }
}

impl SensorBus for LinuxSensorBus {
    fn read_byte(&mut self, register: u8) -> Result<u8, SensorError> {
        self.device
            .smbus_read_byte_data(register)
            .map_err(|e| SensorError::Bus(e.to_string()))
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.device
            .smbus_write_byte_data(register, value)
            .map_err(|e| SensorError::Bus(e.to_string()))
    }

    fn read_block(&mut self, register: u8, len: u8) -> Result<Vec<u8>, SensorError> {
        self.device
            .smbus_read_i2c_block_data(register, len)
            .map_err(|e| SensorError::Bus(e.to_string()))
    }

    fn write_block(&mut self, register: u8, values: &[u8]) -> Result<(), SensorError> {
        self.device
            .smbus_write_i2c_block_data(register, values)
            .map_err(|e| SensorError::Bus(e.to_string()))
    }
}

/// Scripted in-memory bus for driver and pipeline tests.
#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;

    use super::SensorBus;
    use crate::error::SensorError;
    use crate::sensor::mpl3115::STATUS_REG;

    pub struct FakeBus {
        /// Scripted status-register reads, consumed front to back; once
        /// exhausted, `status_default` is returned.
        pub status_reads: VecDeque<u8>,
        pub status_default: u8,
        /// Scripted 5-byte output frames; once exhausted, `default_frame`.
        pub frames: VecDeque<[u8; 5]>,
        pub default_frame: [u8; 5],
        /// Every write issued through the bus, in order.
        pub writes: Vec<(u8, Vec<u8>)>,
    }

    impl FakeBus {
        pub fn ready_with(frame: [u8; 5]) -> Self {
            FakeBus {
                status_reads: VecDeque::new(),
                status_default: 0x08, // data ready
                frames: VecDeque::new(),
                default_frame: frame,
                writes: Vec::new(),
            }
        }

        pub fn never_ready() -> Self {
            let mut bus = Self::ready_with([0; 5]);
            bus.status_default = 0x00;
            bus
        }
    }

    impl SensorBus for FakeBus {
        fn read_byte(&mut self, register: u8) -> Result<u8, SensorError> {
            if register == STATUS_REG {
                Ok(self.status_reads.pop_front().unwrap_or(self.status_default))
            } else {
                Ok(0)
            }
        }

        fn write_byte(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
            self.writes.push((register, vec![value]));
            Ok(())
        }

        fn read_block(&mut self, _register: u8, len: u8) -> Result<Vec<u8>, SensorError> {
            let frame = self.frames.pop_front().unwrap_or(self.default_frame);
            Ok(frame[..len as usize].to_vec())
        }

        fn write_block(&mut self, register: u8, values: &[u8]) -> Result<(), SensorError> {
            self.writes.push((register, values.to_vec()));
            Ok(())
        }
    }
}
