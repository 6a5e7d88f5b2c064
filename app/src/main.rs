//! Console recorder application.
//!
//! Wires the engine to an interactive console: the engine runs on a
//! background thread and everything here talks to it over the command and
//! event channels.

mod console;

use std::path::PathBuf;
use std::thread;

use clap::{value_parser, Arg, Command};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recorder_engine::{Engine, DEFAULT_FPS};
use recorder_ipc::{command_channel, event_channel};

/// Initialize logging.
fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "recorder=info,recorder_engine=info,recorder_capture=info,recorder_audio=info,recorder_encoder=info,recorder_selector=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let matches = Command::new("recorder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Desktop screen recorder with system audio")
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_parser(value_parser!(u32))
                .default_value("30")
                .help("Capture rate in frames per second"),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .value_parser(value_parser!(PathBuf))
                .default_value("recordings")
                .help("Directory where recordings are saved"),
        )
        .get_matches();

    let fps = matches.get_one::<u32>("fps").copied().unwrap_or(DEFAULT_FPS);
    let output_dir = matches
        .get_one::<PathBuf>("output-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("recordings"));
    anyhow::ensure!(fps > 0, "fps must be positive");

    info!(fps, output_dir = %output_dir.display(), "Recorder starting");

    let (command_tx, command_rx) = command_channel();
    let (event_tx, event_rx) = event_channel();

    thread::spawn(move || {
        let mut engine = Engine::new(command_rx, event_tx, fps);
        engine.run();
    });

    console::run(command_tx, event_rx, output_dir)
}
