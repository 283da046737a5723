/// Executive loop driving sampling, persistence and chart generation
use std::fs;

use log::{debug, error, info};
use tokio::time::{sleep, Duration, Instant};

use crate::config::AgentConfig;
use crate::database::RrdDatabase;
use crate::health::{HealthMonitor, Transition};
use crate::pipeline::SamplePipeline;
use crate::publisher::DataPublisher;
use crate::sensor::{Mpl3115, SensorBus};

/// The agent's top-level state: the device driver, the per-cycle pipeline,
/// health bookkeeping and the three independent schedule timestamps.
///
/// Everything except chart generation runs sequentially on this single
/// task; the health counter and the spike-filter reference are safe to
/// mutate without synchronization because nothing else touches them.
pub struct Agent<B: SensorBus> {
    config: AgentConfig,
    sensor: Mpl3115<B>,
    pipeline: SamplePipeline,
    health: HealthMonitor,
    database: RrdDatabase,
    publisher: DataPublisher,
    last_sample: Option<Instant>,
    last_db_update: Option<Instant>,
    last_chart_update: Option<Instant>,
}

impl<B: SensorBus> Agent<B> {
    pub fn new(
        config: AgentConfig,
        sensor: Mpl3115<B>,
        database: RrdDatabase,
        publisher: DataPublisher,
        initial_pressure_kpa: f64,
    ) -> Self {
        Agent {
            config,
            sensor,
            pipeline: SamplePipeline::new(initial_pressure_kpa),
            health: HealthMonitor::new(),
            database,
            publisher,
            // None means due immediately, so every activity fires on the
            // first iteration.
            last_sample: None,
            last_db_update: None,
            last_chart_update: None,
        }
    }

    /// Run the loop until the surrounding task is dropped.
    pub async fn run(&mut self) {
        info!("starting sampling loop");
        loop {
            self.cycle().await;
        }
    }

    /// One scheduler iteration: a single time reading decides which
    /// activities are due, due work fires within the same iteration, then
    /// the loop sleeps for whatever remains of the sample interval so the
    /// cadence self-corrects for processing jitter.
    pub async fn cycle(&mut self) {
        let now = Instant::now();

        if is_due(self.last_sample, self.config.sample_interval, now) {
            self.last_sample = Some(now);
            let success = self.run_sampling_tick(now).await;
            debug!(
                "update {}: {:.6} sec",
                if success { "successful" } else { "failed" },
                now.elapsed().as_secs_f64()
            );
        }

        if is_due(self.last_chart_update, self.config.chart_interval, now) {
            self.last_chart_update = Some(now);
            // Chart rendering takes seconds; run it detached so it never
            // stalls the sampling cadence. It logs its own failures.
            let database = self.database.clone();
            tokio::spawn(async move {
                database.generate_day_charts().await;
            });
        }

        let remaining = self.config.sample_interval.saturating_sub(now.elapsed());
        sleep(remaining).await;
    }

    /// Acquire, publish and persist one sample; feed the outcome into the
    /// health monitor. Returns whether the cycle produced a valid sample.
    async fn run_sampling_tick(&mut self, now: Instant) -> bool {
        if let Err(e) = self.check_for_reset().await {
            error!("altimeter reset failed: {}", e);
        }

        let success = match self.pipeline.acquire(&mut self.sensor).await {
            Ok(sample) => {
                if let Err(e) = self.publisher.publish(&sample) {
                    error!("failed to write output data file: {}", e);
                }

                // Storage health is independent of sensor health: a failed
                // update is logged and the next due flush retries with
                // fresh data.
                if is_due(self.last_db_update, self.config.db_update_interval, now) {
                    self.last_db_update = Some(now);
                    if let Err(e) = self
                        .database
                        .update(
                            sample.time,
                            sample.altitude_m,
                            sample.pressure_inhg,
                            sample.temp_f,
                        )
                        .await
                    {
                        error!("database update failed: {}", e);
                    }
                }
                true
            }
            Err(e) => {
                error!("failed to get sensor data: {}", e);
                false
            }
        };

        match self.health.record(success) {
            Some(Transition::CameOnline) => info!("sensor online"),
            Some(Transition::WentOffline) => {
                info!("sensor offline");
                // Downstream clients must not read stale data.
                if let Err(e) = self.publisher.invalidate() {
                    error!("failed to remove output data file: {}", e);
                }
            }
            None => {}
        }
        success
    }

    /// Re-zero the altimeter when the external reset signal file exists:
    /// read the current pressure, write it as the barometric offset and
    /// lower the flag by removing the file.
    async fn check_for_reset(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.config.reset_file.exists() {
            return Ok(());
        }
        let unit = self.config.calibration_unit;
        let pressure = self.sensor.read_pressure(unit).await?;
        info!("setting altimeter to: {:.2}", pressure);
        self.sensor.set_pressure_offset(pressure, unit)?;
        fs::remove_file(&self.config.reset_file)?;
        Ok(())
    }
}

fn is_due(last: Option<Instant>, interval: Duration, now: Instant) -> bool {
    match last {
        None => true,
        Some(fired) => now.duration_since(fired) >= interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PressureUnit;
    use crate::sensor::bus::fake::FakeBus;
    use std::path::Path;

    // Frame decoding to 25.0 m altitude, 0.1 kPa pressure, 25.0 C.
    const READY_FRAME: [u8; 5] = [0x00, 0x19, 0x00, 0x19, 0x00];

    fn test_config(dir: &Path) -> AgentConfig {
        AgentConfig {
            charts_dir: dir.join("charts"),
            output_data_file: dir.join("altimeterData.js"),
            rrd_file: dir.join("altimeterData.rrd"),
            reset_file: dir.join("resetAltimeter"),
            i2c_device: dir.join("i2c-unused"),
            sensor_address: 0x60,
            calibration_unit: PressureUnit::InchesHg,
            sample_interval: Duration::from_secs(5),
            db_update_interval: Duration::from_secs(30),
            chart_interval: Duration::from_secs(300),
        }
    }

    fn test_agent(dir: &Path, bus: FakeBus) -> Agent<FakeBus> {
        let config = test_config(dir);
        let sensor = Mpl3115::new(bus).unwrap();
        let database = RrdDatabase::new(config.rrd_file.clone(), config.charts_dir.clone());
        let publisher = DataPublisher::new(
            config.output_data_file.clone(),
            config.chart_interval.as_secs(),
        );
        Agent::new(config, sensor, database, publisher, 0.1)
    }

    #[tokio::test(start_paused = true)]
    async fn successful_cycle_publishes_decoded_sample() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = test_agent(dir.path(), FakeBus::ready_with(READY_FRAME));

        agent.cycle().await;

        let contents = fs::read_to_string(dir.path().join("altimeterData.js")).unwrap();
        assert!(contents.contains("\"altitude\":\"25.0\""));
        assert!(contents.contains("\"status\":\"online\""));
    }

    #[tokio::test(start_paused = true)]
    async fn cadence_self_corrects_for_processing_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = test_agent(dir.path(), FakeBus::ready_with(READY_FRAME));

        // First cycle fires everything that is due at startup.
        agent.cycle().await;

        let mut periods = Vec::new();
        let mut previous = Instant::now();
        for _ in 0..4 {
            agent.cycle().await;
            let now = Instant::now();
            periods.push(now.duration_since(previous));
            previous = now;
        }

        // Each cycle spends several poll sub-intervals reading the sensor,
        // yet the period holds at the configured interval.
        for period in periods {
            assert!(period >= Duration::from_secs(5));
            assert!(period < Duration::from_secs(5) + Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn three_failed_cycles_take_the_sensor_offline() {
        let dir = tempfile::tempdir().unwrap();
        let mut agent = test_agent(dir.path(), FakeBus::never_ready());
        let data_file = dir.path().join("altimeterData.js");

        // Seed a published file so the offline transition has something
        // to invalidate.
        fs::write(&data_file, "[{}]").unwrap();

        for _ in 0..2 {
            agent.cycle().await;
            assert!(agent.health.is_online());
            assert!(data_file.exists());
        }
        agent.cycle().await;
        assert!(!agent.health.is_online());
        assert!(!data_file.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_signal_is_consumed_and_offset_written() {
        let dir = tempfile::tempdir().unwrap();
        let reset_file = dir.path().join("resetAltimeter");
        fs::write(&reset_file, "").unwrap();

        let mut agent = test_agent(dir.path(), FakeBus::ready_with(READY_FRAME));
        agent.cycle().await;

        assert!(!reset_file.exists());
    }
}
