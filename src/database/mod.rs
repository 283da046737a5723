pub mod command;
pub mod operations;

pub use operations::RrdDatabase;
