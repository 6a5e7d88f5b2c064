use thiserror::Error;

use recorder_encoder::EncoderError;

/// Errors that can occur while controlling a recording session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Start was requested while a recording is active.
    #[error("A recording is already in progress")]
    AlreadyRecording,

    /// Stop or a region update was requested with no recording active.
    #[error("No recording is in progress")]
    NotRecording,

    /// The requested region has a zero dimension.
    #[error("Invalid capture region: {width}x{height}")]
    InvalidRegion { width: u32, height: u32 },

    /// The encoder pipeline failed.
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    /// Filesystem error while handling session output.
    #[error("Session I/O error: {0}")]
    Io(#[from] std::io::Error),
}
