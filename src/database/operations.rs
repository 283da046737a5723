/// Round robin database operations: schema creation, updates and charts
use std::path::PathBuf;
use std::time::Duration;

use log::{error, info};
use time::OffsetDateTime;

use crate::database::command::run_rrdtool;
use crate::error::DatabaseError;

// Standard chart dimensions in pixels.
const CHART_WIDTH: u32 = 600;
const CHART_HEIGHT: u32 = 150;

/// Chart set regenerated on the chart interval: 1-day and 10-day views of
/// each data source. (name, data source, vertical label, title, start)
const DAY_CHARTS: [(&str, &str, &str, &str, &str); 6] = [
    ("1d_altitude", "altitude", "meters", "Altitude", "now-1d"),
    ("1d_pressure", "pressure", "inches Hg", "Barometric Pressure", "now-1d"),
    ("1d_temperature", "temperature", "degrees Fahrenheit", "Temperature", "now-1d"),
    ("10d_altitude", "altitude", "meters", "Altitude", "end-10days"),
    ("10d_pressure", "pressure", "inches Hg", "Barometric Pressure", "end-10days"),
    ("10d_temperature", "temperature", "degrees Fahrenheit", "Temperature", "end-10days"),
];

/// Handle to the rrdtool database and its chart output directory.
///
/// Cheap to clone; chart regeneration runs on a clone inside a detached
/// task so it never blocks the sampling loop.
#[derive(Debug, Clone)]
pub struct RrdDatabase {
    rrd_file: PathBuf,
    charts_dir: PathBuf,
}

impl RrdDatabase {
    pub fn new(rrd_file: PathBuf, charts_dir: PathBuf) -> Self {
        RrdDatabase {
            rrd_file,
            charts_dir,
        }
    }

    pub fn exists(&self) -> bool {
        self.rrd_file.exists()
    }

    /// Create the round robin database: one step per update interval,
    /// three GAUGE data sources with a heartbeat of two steps, and a
    /// single AVERAGE archive sized to `size_days`.
    ///
    /// Creating a database wipes out any previous one with the same name,
    /// so an existing file must be deleted manually first.
    pub async fn create(&self, step: Duration, size_days: u32) -> Result<(), DatabaseError> {
        if self.exists() {
            return Err(DatabaseError::Exists(self.rrd_file.clone()));
        }

        let step_secs = step.as_secs();
        let heartbeat = 2 * step_secs;
        let rows = size_days as u64 * (86400 / step_secs);

        info!("creating rrdtool database: {}", self.rrd_file.display());
        run_rrdtool([
            "create".to_string(),
            self.rrd_file.display().to_string(),
            "--step".to_string(),
            step_secs.to_string(),
            format!("DS:altitude:GAUGE:{}:U:U", heartbeat),
            format!("DS:pressure:GAUGE:{}:U:U", heartbeat),
            format!("DS:temperature:GAUGE:{}:U:U", heartbeat),
            format!("RRA:AVERAGE:0.5:1:{}", rows),
        ])
        .await?;
        info!("database creation successful");
        Ok(())
    }

    /// Append one sample to the database.
    pub async fn update(
        &self,
        time: OffsetDateTime,
        altitude_m: f64,
        pressure_inhg: f64,
        temp_f: f64,
    ) -> Result<(), DatabaseError> {
        run_rrdtool([
            "update".to_string(),
            self.rrd_file.display().to_string(),
            format!(
                "{}:{:.1}:{:.4}:{:.2}",
                time.unix_timestamp(),
                altitude_m,
                pressure_inhg,
                temp_f
            ),
        ])
        .await?;
        Ok(())
    }

    /// Render one auto-scaled line chart as a PNG in the charts directory.
    pub async fn create_auto_graph(
        &self,
        name: &str,
        data_source: &str,
        vertical_label: &str,
        title: &str,
        start: &str,
    ) -> Result<(), DatabaseError> {
        let png_path = self.charts_dir.join(format!("{}.png", name));
        run_rrdtool([
            "graph".to_string(),
            png_path.display().to_string(),
            "-a".to_string(),
            "PNG".to_string(),
            "-s".to_string(),
            start.to_string(),
            "-e".to_string(),
            "now".to_string(),
            "-w".to_string(),
            CHART_WIDTH.to_string(),
            "-h".to_string(),
            CHART_HEIGHT.to_string(),
            "-v".to_string(),
            vertical_label.to_string(),
            "-t".to_string(),
            title.to_string(),
            "-A".to_string(),
            format!(
                "DEF:{}={}:{}:AVERAGE",
                data_source,
                self.rrd_file.display(),
                data_source
            ),
            format!("LINE2:{}#0400ff", data_source),
        ])
        .await?;
        Ok(())
    }

    /// Regenerate the full day-chart set. Fire-and-forget: failures are
    /// logged here and never reported to the sampling loop.
    pub async fn generate_day_charts(&self) {
        for (name, data_source, label, title, start) in DAY_CHARTS {
            if let Err(e) = self
                .create_auto_graph(name, data_source, label, title, start)
                .await
            {
                error!("failed to generate chart {}: {}", name, e);
            }
        }
    }
}
