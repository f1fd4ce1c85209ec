//! stick-bridge command line
//!
//! `calibrate` records the resting and extreme positions of each joystick;
//! `run` starts the sampling loop that drives keyboard/mouse input and the
//! WebSocket broadcast.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::bounded;
use log::{info, warn};
use std::path::{Path, PathBuf};
use stick_bridge::backend::{self, BackendPair};
use stick_bridge::calibration::{CalibrationProcedure, CalibrationStore, StdinGate};
use stick_bridge::config::{Config, DEFAULT_CONFIG_PATH};
use stick_bridge::emitter::{ControlMode, InputEmitter};
use stick_bridge::{
    load_resolvers, Bridge, BridgeSettings, BroadcastHub, BroadcastServer, FrameReader, JoystickId,
    KeyboardBackend, MouseBackend, SerialTransport, TextLineFormat,
};

type CliBridge = Bridge<SerialTransport, TextLineFormat, Box<dyn KeyboardBackend>, Box<dyn MouseBackend>>;

#[derive(Parser, Debug)]
#[command(name = "stick-bridge", version, about = "Serial joystick to keyboard/mouse and WebSocket bridge")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (defaults to configs/default.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Serial port override, e.g. COM10 or /dev/ttyUSB0
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture center and extremes for each joystick and save them
    Calibrate {
        /// Joystick number (1, 2, ...) or "all"
        #[arg(short, long, default_value = "all")]
        joystick: String,
    },

    /// Start the sampling loop
    Run {
        /// Control mode: 1/mouse, 2/keyhold, 3/mouseclick, 4/keypulse
        #[arg(short, long)]
        mode: Option<ControlMode>,

        /// Broadcast only, never inject input
        #[arg(long)]
        no_input: bool,

        /// Log input instead of injecting it
        #[arg(long)]
        dry_run: bool,

        /// Do not start the WebSocket endpoint
        #[arg(long)]
        no_broadcast: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.serial.port = port;
    }

    match cli.command {
        Command::Calibrate { joystick } => calibrate(&config, &joystick),
        Command::Run {
            mode,
            no_input,
            dry_run,
            no_broadcast,
        } => {
            if let Some(mode) = mode {
                config.control.mode = mode;
            }
            if no_broadcast {
                config.broadcast.enabled = false;
            }
            run(&config, no_input, dry_run)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            Config::load_default().with_context(|| format!("loading {}", DEFAULT_CONFIG_PATH))
        }
        None => {
            warn!("{} not found, using built-in defaults", DEFAULT_CONFIG_PATH);
            Ok(Config::default())
        }
    }
}

fn selected_joysticks(selection: &str, stick_count: usize) -> Result<Vec<JoystickId>> {
    if selection.eq_ignore_ascii_case("all") {
        return Ok((0..stick_count).map(JoystickId::from_index).collect());
    }

    let number: u8 = selection
        .trim()
        .parse()
        .with_context(|| format!("invalid joystick '{}'", selection))?;
    if number == 0 || usize::from(number) > stick_count {
        bail!("joystick {} not in 1..={}", number, stick_count);
    }
    Ok(vec![JoystickId(number)])
}

fn calibrate(config: &Config, selection: &str) -> Result<()> {
    let stick_count = config.stick_count();
    let joysticks = selected_joysticks(selection, stick_count)?;
    let store = CalibrationStore::new(&config.calibration.directory, stick_count);

    let mut transport = SerialTransport::open(config.serial_settings())
        .with_context(|| format!("opening {}", config.serial.port))?;

    let mut procedure =
        CalibrationProcedure::new(&mut transport, TextLineFormat, stick_count, config.capture_window());
    let outcomes = procedure.run(&joysticks, &mut StdinGate, &store)?;

    for outcome in &outcomes {
        if outcome.unresolved.is_empty() {
            info!("✓ {} calibrated", outcome.joystick);
        } else {
            let names: Vec<&str> = outcome.unresolved.iter().map(|p| p.name()).collect();
            warn!(
                "{} saved without {}; `run` will refuse it until recalibrated",
                outcome.joystick,
                names.join(", ")
            );
        }
    }
    Ok(())
}

fn input_backends(dry_run: bool) -> BackendPair {
    if dry_run {
        info!("Dry run: input is logged, not injected");
        return backend::mock_backends().0;
    }

    match backend::platform_backends() {
        Ok(pair) => {
            warn!("⚠️  Sending REAL keyboard/mouse input");
            pair
        }
        Err(e) => {
            warn!("{}; falling back to logging backends", e);
            backend::mock_backends().0
        }
    }
}

fn run(config: &Config, no_input: bool, dry_run: bool) -> Result<()> {
    let stick_count = config.stick_count();
    let store = CalibrationStore::new(&config.calibration.directory, stick_count);
    let resolvers = load_resolvers(&store, stick_count, config.resolver_settings())
        .context("calibration required; run `stick-bridge calibrate` first")?;

    let (stop_tx, stop_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.try_send(());
    })
    .context("installing Ctrl-C handler")?;

    let hub = BroadcastHub::new();
    let server = if config.broadcast.enabled {
        Some(BroadcastServer::spawn(config.broadcast_addr()?, hub.clone())?)
    } else {
        None
    };

    let mode = config.control.mode;
    let settings = BridgeSettings {
        mode,
        max_parse_errors: config.serial.max_parse_errors,
        poll_interval: config.poll_interval(),
    };

    let transport = SerialTransport::new(config.serial_settings());
    let mut bridge: CliBridge = Bridge::new(transport, FrameReader::new(TextLineFormat, stick_count), resolvers, settings)?;

    if no_input {
        info!("Input emission disabled");
    } else {
        let (keyboard, mouse) = input_backends(dry_run);
        let emitter = InputEmitter::new(keyboard, mouse, mode.emitter_mode(), config.direction_maps()?)
            .with_pointer_scale(config.control.pointer_scale)
            .with_pointer_stick(config.pointer_stick());
        bridge = bridge.with_emitter(emitter);
    }
    if server.is_some() {
        bridge = bridge.with_hub(hub);
    }

    bridge.run(&stop_rx);

    if let Some(server) = server {
        server.shutdown();
    }
    info!("Bye");
    Ok(())
}
