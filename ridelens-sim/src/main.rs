//! RideLens host simulator
//!
//! Runs the bridge coordinator on the embassy std executor with console
//! transports standing in for the ride computer and the glasses. With
//! `--simulate` the coordinator feeds itself synthetic ride data.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use embassy_executor::Spawner;
use embassy_time::Timer;
use log::{error, info, warn};
use static_cell::StaticCell;

use ridelens_bridge::{
    load_settings, post, run_coordinator, LoadedConfig, EVENTS, PAIRED_ADDRESS, STATUS,
};
use ridelens_core::coordinator::Coordinator;
use ridelens_core::metrics::RideState;
use ridelens_core::state::Event;

mod transport;

use transport::{ConsoleSink, ConsoleSource};

/// Settings used when no file is given
const EMBEDDED_CONFIG: &str = include_str!("../bridge.toml");

type SimCoordinator = Coordinator<ConsoleSource, ConsoleSink>;

static COORDINATOR: StaticCell<SimCoordinator> = StaticCell::new();

#[derive(Parser, Debug, Clone)]
#[command(name = "ridelens-sim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (TOML). Defaults to the built-in settings
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed synthetic ride data
    #[arg(short = 's', long = "simulate", default_value_t = true, action = ArgAction::Set)]
    simulate: bool,

    /// Report the ride as already recording
    #[arg(short = 'r', long = "record")]
    record: bool,

    /// Shut down after this many seconds
    #[arg(short = 'd', long = "duration", value_name = "SECONDS")]
    duration: Option<u64>,

    /// Debug level: 0 = info, 1 = debug, 2+ = trace
    #[arg(short = 'v', long = "verbose", default_value = "0")]
    verbose: u8,
}

fn read_config(cli: &Cli) -> Result<LoadedConfig, String> {
    let text = match &cli.config {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?,
        None => EMBEDDED_CONFIG.to_owned(),
    };
    load_settings(&text).map_err(|e| format!("invalid settings: {}", e))
}

#[embassy_executor::task]
async fn coordinator_task(coordinator: &'static mut SimCoordinator) {
    run_coordinator(coordinator, EVENTS.receiver()).await;
    info!("Bridge stopped");
    std::process::exit(0);
}

#[embassy_executor::task]
async fn status_task() {
    let Some(mut receiver) = STATUS.receiver() else {
        warn!("No status receiver available");
        return;
    };
    loop {
        let status = receiver.changed().await;
        info!(
            "Status: {:?} (source {:?}, glasses {:?}, ride {:?}, simulating {})",
            status.bridge, status.source, status.sink, status.ride, status.simulating
        );
    }
}

#[embassy_executor::task]
async fn pairing_task(config: Option<PathBuf>) {
    loop {
        let address = PAIRED_ADDRESS.wait().await;
        let target = config
            .as_ref()
            .map_or_else(|| "the settings file".to_owned(), |p| p.display().to_string());
        warn!(
            "Paired with new glasses; add `last_address = \"{}\"` under [sink] in {} to reconnect automatically",
            address.as_str(),
            target
        );
    }
}

#[embassy_executor::task]
async fn shutdown_task(seconds: u64) {
    Timer::after_secs(seconds).await;
    info!("Run time of {} s elapsed", seconds);
    post(Event::Shutdown);
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("Starting ridelens-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = match read_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let paired = config.settings.last_sink_address.is_some();
    let ride = if cli.record {
        RideState::Recording
    } else {
        RideState::Idle
    };
    let coordinator = COORDINATOR.init(Coordinator::new(
        ConsoleSource::new(ride),
        ConsoleSink::new(),
        config.settings,
        config.profile,
    ));

    // Intents queued ahead of the coordinator's first receive
    post(Event::SetSimulation(cli.simulate));
    if !paired {
        info!("No paired glasses, scanning");
        post(Event::StartManualScan);
    }

    if let Err(e) = spawner.spawn(status_task()) {
        error!("Failed to spawn status task: {:?}", e);
    }
    if let Err(e) = spawner.spawn(pairing_task(cli.config.clone())) {
        error!("Failed to spawn pairing task: {:?}", e);
    }
    if let Some(seconds) = cli.duration {
        if let Err(e) = spawner.spawn(shutdown_task(seconds)) {
            error!("Failed to spawn shutdown task: {:?}", e);
        }
    }
    if let Err(e) = spawner.spawn(coordinator_task(coordinator)) {
        error!("Failed to spawn coordinator task: {:?}", e);
        std::process::exit(1);
    }

    info!("All tasks spawned, bridge running");
}
