mod agent;
mod config;
mod database;
mod error;
mod health;
mod models;
mod pipeline;
mod publisher;
mod sensor;
mod utils;

use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

use agent::Agent;
use config::AgentConfig;
use database::RrdDatabase;
use models::PressureUnit;
use publisher::DataPublisher;
use sensor::decode::INHG_PER_KPA;
use sensor::{LinuxSensorBus, Mpl3115};

// Database schema parameters, fixed at creation time.
const DATABASE_STEP_SECS: u64 = 30;
const DATABASE_SIZE_DAYS: u32 = 180;

#[derive(Parser)]
#[command(about = "MPL3115A2 altimeter telemetry agent")]
struct Cli {
    /// Log per-cycle sensor values and processing time
    #[arg(short = 'v')]
    verbose: bool,

    /// Log raw register traffic (implies -v)
    #[arg(short = 'd')]
    debug: bool,

    /// Sensor polling interval in seconds
    #[arg(short = 'p', value_name = "SECONDS")]
    polling_interval: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create the round robin database and exit
    CreateDb,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; -v raises the default level to debug, -d to
    // trace so raw register frames get dumped as well.
    let level = if cli.debug {
        log::LevelFilter::Trace
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let mut config = match AgentConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    if let Some(secs) = cli.polling_interval {
        config.sample_interval = Duration::from_secs(secs);
    }

    let database = RrdDatabase::new(config.rrd_file.clone(), config.charts_dir.clone());

    if let Some(Command::CreateDb) = cli.command {
        database
            .create(Duration::from_secs(DATABASE_STEP_SECS), DATABASE_SIZE_DAYS)
            .await?;
        return Ok(());
    }

    info!("=== starting up altimeter agent process");

    let bus = LinuxSensorBus::open(&config.i2c_device, config.sensor_address)?;
    let mut sensor = Mpl3115::new(bus)?;

    let (id, status, control) = sensor.device_info()?;
    debug!(
        "manufacturer ID: {:08b}  status register: {:08b}  control register: {:08b}",
        id, status, control
    );

    // Startup calibration: zero the altimeter against the current local
    // pressure so it reads altitude above ground level.
    let pressure_kpa = sensor.read_pressure(PressureUnit::KiloPascals).await?;
    sensor.set_pressure_offset(pressure_kpa, PressureUnit::KiloPascals)?;
    info!("setting altimeter to: {:.2}", pressure_kpa * INHG_PER_KPA);

    if !database.exists() {
        warn!(
            "database {} does not exist; run `altimeter-agent create-db` to create it",
            config.rrd_file.display()
        );
    }

    let publisher = DataPublisher::new(
        config.output_data_file.clone(),
        config.chart_interval.as_secs(),
    );
    let mut agent = Agent::new(
        config,
        sensor,
        database,
        publisher.clone(),
        pressure_kpa,
    );

    // Run until SIGINT or SIGTERM.
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = agent.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("terminating agent process");
        }
        _ = sigterm.recv() => {
            info!("terminating agent process");
        }
    }

    // Downstream clients must never read stale data after the agent exits.
    if let Err(e) = publisher.invalidate() {
        error!("failed to remove output data file: {}", e);
    }

    Ok(())
}
