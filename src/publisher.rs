/// Latest-value JSON publisher for downstream html clients
use std::fs;
use std::io;
use std::path::PathBuf;

use log::debug;
use serde::Serialize;

use crate::models::{AltimeterSample, SensorStatus};
use crate::utils::format_datetime;

/// One record of the published data file. All values are stringified, the
/// shape the html clients expect.
#[derive(Debug, Serialize)]
struct PublishedRecord {
    date: String,
    #[serde(rename = "chartUpdateInterval")]
    chart_update_interval: String,
    altitude: String,
    pressure: String,
    bar: String,
    #[serde(rename = "tempC")]
    temp_c: String,
    #[serde(rename = "tempF")]
    temp_f: String,
    status: SensorStatus,
}

/// Writes the most recent sample to a single JSON data file, atomically
/// replaced each cycle. Removing the file is how downstream clients learn
/// the sensor is offline, so `invalidate` runs on the offline transition
/// and at shutdown.
#[derive(Debug, Clone)]
pub struct DataPublisher {
    path: PathBuf,
    chart_interval_secs: u64,
}

impl DataPublisher {
    pub fn new(path: PathBuf, chart_interval_secs: u64) -> Self {
        DataPublisher {
            path,
            chart_interval_secs,
        }
    }

    /// Serialize the sample and replace the data file via a temp file and
    /// rename, so clients never observe a partial write.
    pub fn publish(&self, sample: &AltimeterSample) -> io::Result<()> {
        let record = PublishedRecord {
            date: format_datetime(&sample.time),
            chart_update_interval: self.chart_interval_secs.to_string(),
            altitude: format!("{:.1}", sample.altitude_m),
            pressure: format!("{:.4}", sample.pressure_kpa),
            bar: format!("{:.4}", sample.pressure_inhg),
            temp_c: format!("{:.2}", sample.temp_c),
            temp_f: format!("{:.2}", sample.temp_f),
            status: sample.status,
        };
        // Array-wrapped single object, matching the client side.
        let json = serde_json::to_string(&[record])?;
        debug!("publishing: {}", json);

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)
    }

    /// Remove the data file. An already-missing file is not an error.
    pub fn invalidate(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
