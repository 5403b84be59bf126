use clap::Parser;
use crossbeam_channel::{bounded, select, unbounded};
use flotilla_config::{load_or_default, validate, Config, MotionType, SenderType, SerializerType};
use flotilla_core::{Fleet, RngSource};
use flotilla_simulation::{MotionStrategy, Scheduler, Simulation, SimulationSettings};
use flotilla_transport::{
    BinarySerializer, JsonSerializer, NullSender, Sender, Serializer, StdioSender, TransportSink,
};
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;
use std::process;

#[cfg(not(feature = "websocket"))]
use flotilla_transport::TransportError;
#[cfg(feature = "websocket")]
use flotilla_transport::WebSocketSender;

mod stats;

use stats::TickStats;

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulated vessel fleet feeding a live map", long_about = None)]
struct Args {
    /// Path to a JSON or TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks instead of running until Ctrl+C.
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Seed for a reproducible run (overrides the config file).
    #[arg(long)]
    seed: Option<u64>,

    /// Tick interval in milliseconds (overrides the config file).
    #[arg(long)]
    interval_ms: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(interval_ms) = args.interval_ms {
        config.tick_interval_ms = interval_ms;
    }
    validate(&config)?;

    let mut rng = match config.seed {
        Some(seed) => {
            info!("Using seed {}", seed);
            RngSource::seeded(seed)
        }
        None => RngSource::from_entropy(),
    };
    let fleet = Fleet::initialize(&config.vessels, &mut rng)?;
    info!("Fleet of {} vessels ready", fleet.len());

    let sink = TransportSink::new(create_serializer(&config), create_sender(&config)?);
    let simulation = Simulation::new(fleet, simulation_settings(&config), Box::new(rng), Box::new(sink));

    let (report_tx, report_rx) = unbounded();
    let mut scheduler = Scheduler::new(config.tick_interval()).with_reports(report_tx);
    if let Some(ticks) = args.ticks {
        scheduler = scheduler.with_max_ticks(ticks);
    }

    let (interrupt_tx, interrupt_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.try_send(());
    })?;

    let running = scheduler.spawn(simulation)?;
    let mut stats = TickStats::new()?;

    loop {
        select! {
            recv(interrupt_rx) -> _ => {
                info!("Interrupted, stopping the simulation");
                break;
            }
            recv(report_rx) -> report => match report {
                Ok(report) => stats.record(&report),
                // The engine thread dropped its end: it finished on its own.
                Err(_) => break,
            },
        }
    }

    let simulation = running.stop()?;
    for (id, position) in simulation.positions() {
        info!("Vessel {} final position [{:.6}, {:.6}]", id, position.lon, position.lat);
    }
    stats.log_summary();
    Ok(())
}

fn simulation_settings(config: &Config) -> SimulationSettings {
    let strategy = match config.motion {
        MotionType::Heading => MotionStrategy::HeadingBased { max_turn: config.max_turn },
        MotionType::IndependentAxis => MotionStrategy::IndependentAxisRandom,
    };
    SimulationSettings {
        step: config.step,
        strategy,
        retention: config.retention,
    }
}

fn create_serializer(config: &Config) -> Box<dyn Serializer> {
    match config.transport.serializer.serializer_type {
        SerializerType::Json => Box::new(JsonSerializer),
        SerializerType::Binary => Box::new(BinarySerializer),
    }
}

fn create_sender(config: &Config) -> Result<Box<dyn Sender>, Box<dyn Error>> {
    match config.transport.sender.sender_type {
        SenderType::Stdio => {
            info!("Sending feature updates to standard output");
            Ok(Box::new(StdioSender::new()))
        }
        SenderType::Null => {
            info!("Discarding feature updates");
            Ok(Box::new(NullSender::new()))
        }
        SenderType::WebSocket => create_websocket_sender(config),
    }
}

#[cfg(feature = "websocket")]
fn create_websocket_sender(config: &Config) -> Result<Box<dyn Sender>, Box<dyn Error>> {
    let options = config.transport.sender.get_websocket_options()?;
    let sender = WebSocketSender::bind(&options.address())?;
    info!("Renderers can connect to ws://{}", sender.local_addr());
    Ok(Box::new(sender))
}

#[cfg(not(feature = "websocket"))]
fn create_websocket_sender(_config: &Config) -> Result<Box<dyn Sender>, Box<dyn Error>> {
    Err(Box::new(TransportError::Unsupported(
        "WebSocket sender configured but the websocket feature is not enabled".to_string(),
    )))
}
