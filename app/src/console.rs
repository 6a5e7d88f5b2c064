//! Interactive console for driving the recorder.

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use recorder_ipc::{RecorderCommand, RecorderEvent, Region, WindowTarget};

const HELP: &str = "\
Commands:
  start L T W H [FILE]   record the region at (L, T) sized WxH
  startw INDEX [FILE]    record the window at INDEX (see: windows)
  windows                list open windows
  region L T W H         move the capture region while recording
  devices                list loopback audio devices
  status                 show session state and stats
  stop                   stop and save the recording
  help                   show this help
  quit                   exit
";

#[derive(Debug, PartialEq)]
enum ConsoleCommand {
    Help,
    Status,
    Start {
        region: Region,
        file: Option<String>,
    },
    StartWindow {
        index: usize,
        file: Option<String>,
    },
    Windows,
    Region(Region),
    Devices,
    Stop,
    Quit,
    Empty,
    Malformed(&'static str),
    Unknown(String),
}

fn parse_region_args(args: &[&str]) -> Option<Region> {
    if args.len() != 4 {
        return None;
    }
    let left = args[0].parse().ok()?;
    let top = args[1].parse().ok()?;
    let width = args[2].parse().ok()?;
    let height = args[3].parse().ok()?;
    Some(Region::new(left, top, width, height))
}

fn parse_line(line: &str) -> ConsoleCommand {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let word = match parts.first() {
        Some(word) => *word,
        None => return ConsoleCommand::Empty,
    };
    let args = &parts[1..];

    match word {
        "help" | "?" => ConsoleCommand::Help,
        "status" => ConsoleCommand::Status,
        "windows" => ConsoleCommand::Windows,
        "devices" => ConsoleCommand::Devices,
        "stop" => ConsoleCommand::Stop,
        "quit" | "exit" => ConsoleCommand::Quit,
        "start" => {
            if args.len() < 4 || args.len() > 5 {
                return ConsoleCommand::Malformed("usage: start L T W H [FILE]");
            }
            match parse_region_args(&args[..4]) {
                Some(region) => ConsoleCommand::Start {
                    region,
                    file: args.get(4).map(|s| s.to_string()),
                },
                None => ConsoleCommand::Malformed("usage: start L T W H [FILE]"),
            }
        }
        "startw" => {
            if args.is_empty() || args.len() > 2 {
                return ConsoleCommand::Malformed("usage: startw INDEX [FILE]");
            }
            match args[0].parse() {
                Ok(index) => ConsoleCommand::StartWindow {
                    index,
                    file: args.get(1).map(|s| s.to_string()),
                },
                Err(_) => ConsoleCommand::Malformed("usage: startw INDEX [FILE]"),
            }
        }
        "region" => match parse_region_args(args) {
            Some(region) => ConsoleCommand::Region(region),
            None => ConsoleCommand::Malformed("usage: region L T W H"),
        },
        other => ConsoleCommand::Unknown(other.to_string()),
    }
}

fn default_file_name() -> String {
    format!(
        "recording_{}.mp4",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

fn resolve_output(output_dir: &Path, file: Option<&str>) -> PathBuf {
    match file {
        Some(name) => output_dir.join(name),
        None => output_dir.join(default_file_name()),
    }
}

fn send(command_tx: &Sender<RecorderCommand>, command: RecorderCommand) -> anyhow::Result<()> {
    command_tx
        .send(command)
        .map_err(|_| anyhow::anyhow!("engine stopped accepting commands"))
}

/// Read console commands from stdin until quit or end of input.
pub fn run(
    command_tx: Sender<RecorderCommand>,
    event_rx: Receiver<RecorderEvent>,
    output_dir: PathBuf,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let windows: Arc<Mutex<Vec<WindowTarget>>> = Arc::new(Mutex::new(Vec::new()));
    let printer_windows = Arc::clone(&windows);
    thread::spawn(move || print_events(event_rx, printer_windows));

    // Report audio availability before the first prompt.
    send(&command_tx, RecorderCommand::GetAudioDevices)?;

    println!("recorder console; type 'help' for commands");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_line(&line) {
            ConsoleCommand::Empty => {}
            ConsoleCommand::Help => print!("{}", HELP),
            ConsoleCommand::Quit => break,
            ConsoleCommand::Status => {
                send(&command_tx, RecorderCommand::GetState)?;
                send(&command_tx, RecorderCommand::GetRegion)?;
                send(&command_tx, RecorderCommand::GetStats)?;
            }
            ConsoleCommand::Windows => send(&command_tx, RecorderCommand::GetWindows)?,
            ConsoleCommand::Devices => send(&command_tx, RecorderCommand::GetAudioDevices)?,
            ConsoleCommand::Stop => send(&command_tx, RecorderCommand::Stop)?,
            ConsoleCommand::Region(region) => {
                send(&command_tx, RecorderCommand::UpdateRegion { region })?
            }
            ConsoleCommand::Start { region, file } => {
                let output_path = resolve_output(&output_dir, file.as_deref());
                send(&command_tx, RecorderCommand::Start { region, output_path })?;
            }
            ConsoleCommand::StartWindow { index, file } => {
                let region = windows.lock().get(index).map(|window| window.region);
                match region {
                    Some(region) => {
                        let output_path = resolve_output(&output_dir, file.as_deref());
                        send(&command_tx, RecorderCommand::Start { region, output_path })?;
                    }
                    None => println!("no window at index {}; run 'windows' first", index),
                }
            }
            ConsoleCommand::Malformed(usage) => println!("{}", usage),
            ConsoleCommand::Unknown(word) => {
                println!("unknown command '{}'; type 'help'", word)
            }
        }
    }

    let _ = command_tx.send(RecorderCommand::Shutdown);
    // Give the engine a moment to save an in-flight recording.
    thread::sleep(Duration::from_millis(300));
    Ok(())
}

fn print_events(event_rx: Receiver<RecorderEvent>, windows: Arc<Mutex<Vec<WindowTarget>>>) {
    loop {
        let event = match event_rx.recv() {
            Ok(event) => event,
            Err(_) => break,
        };

        match event {
            RecorderEvent::Ready => println!("engine ready"),
            RecorderEvent::StateChanged { previous, current } => {
                println!("state: {} -> {}", previous.name(), current.name())
            }
            RecorderEvent::RecordingStarted { output_path, audio } => {
                println!("recording to {} (audio: {})", output_path.display(), audio)
            }
            RecorderEvent::RecordingSaved { path, audio_mixed } => {
                if audio_mixed {
                    println!("saved {} (with audio)", path.display());
                } else {
                    println!("saved {} (video only)", path.display());
                }
            }
            RecorderEvent::RegionUpdated { region } => println!(
                "region: {}x{} at ({}, {})",
                region.width, region.height, region.left, region.top
            ),
            RecorderEvent::CurrentRegion { region } => match region {
                Some(region) => println!(
                    "region: {}x{} at ({}, {})",
                    region.width, region.height, region.left, region.top
                ),
                None => println!("region: unset"),
            },
            RecorderEvent::State(state) => println!("state: {}", state.name()),
            RecorderEvent::Stats(stats) => println!(
                "stats: {} frames, {} errors, {} overruns, {:.1}s, {:.1} fps",
                stats.frames_written,
                stats.capture_errors,
                stats.pacing_overruns,
                stats.elapsed_seconds,
                stats.achieved_fps
            ),
            RecorderEvent::Windows(list) => {
                if list.is_empty() {
                    println!("no capturable windows");
                } else {
                    for (index, window) in list.iter().enumerate() {
                        println!("  [{}] {}", index, window.label);
                    }
                }
                *windows.lock() = list;
            }
            RecorderEvent::AudioDevices(devices) => {
                if devices.is_empty() {
                    println!("system audio: no loopback device, recordings will be video only");
                } else {
                    for device in devices {
                        println!(
                            "system audio: {} ({} ch, {} Hz)",
                            device.name, device.channels, device.sample_rate
                        );
                    }
                }
            }
            RecorderEvent::Error { message } => println!("error: {}", message),
            RecorderEvent::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_with_region() {
        assert_eq!(
            parse_line("start 0 0 1280 720"),
            ConsoleCommand::Start {
                region: Region::new(0, 0, 1280, 720),
                file: None,
            }
        );
        assert_eq!(
            parse_line("start -1920 40 640 480 clip.mp4"),
            ConsoleCommand::Start {
                region: Region::new(-1920, 40, 640, 480),
                file: Some("clip.mp4".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_start_rejects_bad_args() {
        assert!(matches!(
            parse_line("start 1 2 3"),
            ConsoleCommand::Malformed(_)
        ));
        assert!(matches!(
            parse_line("start a b c d"),
            ConsoleCommand::Malformed(_)
        ));
    }

    #[test]
    fn test_parse_startw() {
        assert_eq!(
            parse_line("startw 2"),
            ConsoleCommand::StartWindow {
                index: 2,
                file: None,
            }
        );
        assert_eq!(
            parse_line("startw 0 win.mp4"),
            ConsoleCommand::StartWindow {
                index: 0,
                file: Some("win.mp4".to_string()),
            }
        );
        assert!(matches!(
            parse_line("startw two"),
            ConsoleCommand::Malformed(_)
        ));
    }

    #[test]
    fn test_parse_region_update() {
        assert_eq!(
            parse_line("region -100 50 300 200"),
            ConsoleCommand::Region(Region::new(-100, 50, 300, 200))
        );
    }

    #[test]
    fn test_parse_simple_words() {
        assert_eq!(parse_line("stop"), ConsoleCommand::Stop);
        assert_eq!(parse_line("quit"), ConsoleCommand::Quit);
        assert_eq!(parse_line("exit"), ConsoleCommand::Quit);
        assert_eq!(parse_line("   "), ConsoleCommand::Empty);
        assert_eq!(
            parse_line("bogus"),
            ConsoleCommand::Unknown("bogus".to_string())
        );
    }

    #[test]
    fn test_resolve_output_paths() {
        let dir = Path::new("recordings");
        assert_eq!(
            resolve_output(dir, Some("demo.mp4")),
            PathBuf::from("recordings/demo.mp4")
        );

        let generated = resolve_output(dir, None);
        let name = generated.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("recording_"));
        assert!(name.ends_with(".mp4"));
        // recording_YYYYmmdd_HHMMSS.mp4
        assert_eq!(name.len(), "recording_".len() + 15 + ".mp4".len());
    }
}
