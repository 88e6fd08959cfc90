//! blanc-io - relay daemon for one unit of the pair
//!
//! ## Protocol Architecture
//!
//! - **Serial**: `".\n"` trigger, `y: <n>, z: <n>, pressure: <0|1>` reply
//! - **UDP (port 8888)**: OSC `/data ,iii` to the peer, and the same from it
//!
//! Both units run the same binary; only `peer.address` differs.

use blanc_io::error::{Error, Result};
use blanc_io::threads::spawn_threads;
use blanc_io::transport::SerialTransport;
use blanc_io::{
    ActuatorLoop, Config, DryRunActuator, MotionFlag, PollLoop, SensorLink, TelemetryStore,
    UdpReceiver, UdpSender,
};
use std::env;
use std::path::Path;
use std::process;

const DEFAULT_CONFIG_PATH: &str = "/etc/blanc.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `blanc-io <path>` (positional)
/// - `blanc-io --config <path>` (flag-based)
/// - `blanc-io -c <path>` (short flag)
///
/// Returns `None` when no path was given.
fn parse_config_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();

    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }

    if args.len() > 1 && !args[1].starts_with('-') {
        return Some(args[1].clone());
    }

    None
}

/// Explicit paths must exist; the default path may be absent.
fn load_config(path: Option<&str>) -> Result<(Config, String)> {
    match path {
        Some(path) => Ok((Config::load(path)?, path.to_string())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Ok((
            Config::load(DEFAULT_CONFIG_PATH)?,
            DEFAULT_CONFIG_PATH.to_string(),
        )),
        None => Ok((Config::default(), "built-in defaults".to_string())),
    }
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let (config, source) = load_config(config_path.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    log::info!("blanc-io v{} starting...", env!("CARGO_PKG_VERSION"));
    log::info!("Using config: {}", source);
    log::info!(
        "Serial {} @ {} baud, peer {}:{}, listening on {}:{}",
        config.serial.port,
        config.serial.baud_rate,
        config.peer.address,
        config.peer.port,
        config.listen.bind_address,
        config.listen.port
    );

    ctrlc::set_handler(|| {
        log::info!("Received shutdown signal");
        process::exit(0);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let policy = config.reconnect_policy();
    let telemetry = TelemetryStore::shared();
    let motion = MotionFlag::new();

    let mut link = SensorLink::new(
        SerialTransport::opener(config.serial.port.clone(), config.serial.baud_rate),
        policy,
        config.link_timing(),
    );
    link.connect();

    let sender = UdpSender::connect(&config.peer.address, config.peer.port, &policy);
    let mut receiver = UdpReceiver::bind(config.listen_addr()?, policy, telemetry.clone());

    let poll_loop = PollLoop::new(
        link,
        sender,
        telemetry.clone(),
        motion.clone(),
        config.poll_settings(),
    );
    let actuator_loop = ActuatorLoop::new(
        Box::new(DryRunActuator::new()),
        telemetry,
        motion,
        config.actuator_interval(),
    );

    let handles = spawn_threads(poll_loop, actuator_loop)?;

    log::info!("blanc-io running. Press Ctrl-C to stop.");
    receiver.run(|| match handles.stopped() {
        Some(name) => {
            log::error!("{} thread exited, shutting down", name);
            false
        }
        None => true,
    });

    handles.join()?;
    Err(Error::Other("worker thread exited".into()))
}
