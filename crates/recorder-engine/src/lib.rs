//! Core controller for the recorder.
//!
//! This crate ties capture, audio, and encoding together: a recording
//! session pairs a capture loop thread with an encoder pipeline, and the
//! engine drives the session from a command channel.

mod capture_loop;
mod engine;
mod error;
mod session;
mod stats;

pub use engine::Engine;
pub use error::SessionError;
pub use session::{AudioMode, RecordingSession};
pub use stats::SessionCounters;

use crossbeam_channel::{Receiver, Sender};
use recorder_ipc::{RecorderCommand, RecorderEvent};

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Default capture rate in frames per second.
pub const DEFAULT_FPS: u32 = 30;

/// Create an engine instance wired to IPC channels.
pub fn create_engine(
    command_rx: Receiver<RecorderCommand>,
    event_tx: Sender<RecorderEvent>,
    fps: u32,
) -> Engine {
    Engine::new(command_rx, event_tx, fps)
}
