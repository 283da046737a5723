pub mod bus;
pub mod decode;
pub mod mpl3115;

pub use bus::{LinuxSensorBus, SensorBus};
pub use mpl3115::Mpl3115;
