//! System audio loopback capture.
//!
//! Locates a loopback input device by name heuristics and records what the
//! system is playing into an in-memory buffer, flushed to a 16-bit PCM WAV
//! file when the session stops. Capture is best-effort by design: callers
//! treat every failure here as "record video without audio".

mod capture;
mod device;
mod error;

pub use capture::LoopbackRecorder;
pub use device::{find_loopback_device, is_available, list_loopback_devices};
pub use error::AudioError;

use std::time::Duration;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Sample rate used when the device does not report one.
pub const FALLBACK_SAMPLE_RATE: u32 = 44100;

/// Request at most this many channels from the capture stream.
pub const MAX_CAPTURE_CHANNELS: u16 = 2;

/// How long to wait for the capture stream to come up.
pub const START_TIMEOUT: Duration = Duration::from_secs(2);
