//! Events sent from the engine to the UI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::state::SessionState;
use crate::types::{AudioDeviceInfo, Region, SessionStats, WindowTarget};

/// Events that the engine can send to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecorderEvent {
    /// Session state has changed.
    StateChanged {
        /// Previous state.
        previous: SessionState,

        /// Current state.
        current: SessionState,
    },

    /// A recording has started.
    RecordingStarted {
        /// File the video stream is being written to.
        output_path: PathBuf,

        /// Audio source description ("system loopback" or "none").
        audio: String,
    },

    /// A recording has been finalized on disk.
    RecordingSaved {
        /// Path of the finished artifact.
        path: PathBuf,

        /// Whether system audio was muxed into the file.
        audio_mixed: bool,
    },

    /// The capture region was replaced.
    RegionUpdated {
        /// The region now in effect.
        region: Region,
    },

    /// Response to a region query.
    CurrentRegion {
        /// The active region, if a recording is in progress.
        region: Option<Region>,
    },

    /// Response to a state query.
    State(SessionState),

    /// Periodic or requested session statistics.
    Stats(SessionStats),

    /// List of capturable windows.
    Windows(Vec<WindowTarget>),

    /// List of candidate loopback audio devices.
    AudioDevices(Vec<AudioDeviceInfo>),

    /// Error occurred.
    Error {
        /// Error message.
        message: String,
    },

    /// Engine is ready.
    Ready,

    /// Engine has shut down.
    Shutdown,
}
