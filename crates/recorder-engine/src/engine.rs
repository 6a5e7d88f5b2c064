//! Engine command loop.

use std::path::Path;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, instrument, warn};

use recorder_audio::list_loopback_devices;
use recorder_ipc::{RecorderCommand, RecorderEvent, Region, SessionState};
use recorder_selector::WindowPicker;

use crate::session::RecordingSession;

/// Interval between stats events while recording.
const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// The main recorder engine.
///
/// Owns the recording session and serializes every command against it, so
/// session methods never race with each other.
pub struct Engine {
    command_rx: Receiver<RecorderCommand>,
    event_tx: Sender<RecorderEvent>,
    session: RecordingSession,
    picker: WindowPicker,
    last_stats: Instant,
}

impl Engine {
    /// Create a new engine.
    pub fn new(
        command_rx: Receiver<RecorderCommand>,
        event_tx: Sender<RecorderEvent>,
        fps: u32,
    ) -> Self {
        Self {
            command_rx,
            event_tx,
            session: RecordingSession::new(fps),
            picker: WindowPicker::new(),
            last_stats: Instant::now(),
        }
    }

    /// Run the engine (blocking).
    #[instrument(name = "engine_run", skip(self))]
    pub fn run(&mut self) {
        info!("Engine starting");
        self.send_event(RecorderEvent::Ready);

        loop {
            match self.command_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(command) => {
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    if self.session.state().is_recording()
                        && self.last_stats.elapsed() >= STATS_INTERVAL
                    {
                        self.send_event(RecorderEvent::Stats(self.session.stats()));
                        self.last_stats = Instant::now();
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    info!("Command channel disconnected, shutting down");
                    break;
                }
            }
        }

        if self.session.state().is_recording() {
            if let Err(e) = self.session.stop() {
                warn!("Failed to stop recording on shutdown: {}", e);
            }
        }
        info!("Engine stopped");
    }

    /// Handle a command. Returns false if the engine should stop.
    fn handle_command(&mut self, command: RecorderCommand) -> bool {
        debug!(?command, "Handling command");

        match command {
            RecorderCommand::Start {
                region,
                output_path,
            } => self.start_recording(region, &output_path),
            RecorderCommand::Stop => self.stop_recording(),
            RecorderCommand::UpdateRegion { region } => self.update_region(region),
            RecorderCommand::GetRegion => {
                self.send_event(RecorderEvent::CurrentRegion {
                    region: self.session.current_region(),
                });
            }
            RecorderCommand::GetState => {
                self.send_event(RecorderEvent::State(self.session.state()));
            }
            RecorderCommand::GetStats => {
                self.send_event(RecorderEvent::Stats(self.session.stats()));
            }
            RecorderCommand::GetWindows => self.send_windows(),
            RecorderCommand::GetAudioDevices => {
                self.send_event(RecorderEvent::AudioDevices(list_loopback_devices()));
            }
            RecorderCommand::Shutdown => {
                if self.session.state().is_recording() {
                    self.stop_recording();
                }
                self.send_event(RecorderEvent::Shutdown);
                return false;
            }
        }

        true
    }

    #[instrument(name = "start_recording", skip(self))]
    fn start_recording(&mut self, region: Region, output_path: &Path) {
        match self.session.start(region, output_path) {
            Ok(()) => {
                self.send_event(RecorderEvent::StateChanged {
                    previous: SessionState::Idle,
                    current: SessionState::Recording,
                });
                self.send_event(RecorderEvent::RecordingStarted {
                    output_path: output_path.to_path_buf(),
                    audio: self.session.audio_mode().name().to_string(),
                });
                self.last_stats = Instant::now();
            }
            Err(e) => {
                error!("Recording start failed: {}", e);
                self.send_event(RecorderEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    fn stop_recording(&mut self) {
        let was_recording = self.session.state().is_recording();
        match self.session.stop() {
            Ok(path) => {
                if was_recording {
                    self.send_event(RecorderEvent::StateChanged {
                        previous: SessionState::Recording,
                        current: SessionState::Idle,
                    });
                }
                self.send_event(RecorderEvent::RecordingSaved {
                    path,
                    audio_mixed: self.session.last_mux_succeeded(),
                });
            }
            Err(e) => {
                error!("Recording stop failed: {}", e);
                if was_recording {
                    self.send_event(RecorderEvent::StateChanged {
                        previous: SessionState::Recording,
                        current: SessionState::Idle,
                    });
                }
                self.send_event(RecorderEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    fn update_region(&mut self, region: Region) {
        match self.session.update_region(region) {
            Ok(()) => self.send_event(RecorderEvent::RegionUpdated { region }),
            Err(e) => self.send_event(RecorderEvent::Error {
                message: e.to_string(),
            }),
        }
    }

    fn send_windows(&mut self) {
        match self.picker.refresh() {
            Ok(_) => {
                self.send_event(RecorderEvent::Windows(self.picker.entries().to_vec()));
            }
            Err(e) => {
                warn!("Window enumeration failed: {}", e);
                self.send_event(RecorderEvent::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    fn send_event(&self, event: RecorderEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Failed to send event: {}", e);
        }
    }
}
