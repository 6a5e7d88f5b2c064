//! Commands sent from the UI to the engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Region;

/// Commands that the UI can send to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RecorderCommand {
    /// Start recording the given region into the given file.
    Start { region: Region, output_path: PathBuf },

    /// Stop the current recording and finalize the output file.
    Stop,

    /// Replace the capture region of the active recording.
    UpdateRegion { region: Region },

    /// Request the current capture region.
    GetRegion,

    /// Request the current session state.
    GetState,

    /// Request a snapshot of the session statistics.
    GetStats,

    /// Request the list of capturable windows.
    GetWindows,

    /// Request the list of candidate loopback audio devices.
    GetAudioDevices,

    /// Shutdown the engine completely.
    Shutdown,
}
