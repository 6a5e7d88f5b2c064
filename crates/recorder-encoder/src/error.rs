use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors that can occur during encoding and muxing.
#[derive(Debug, Error)]
pub enum EncoderError {
    /// ffmpeg is not installed or not on PATH.
    #[error("ffmpeg not found on PATH")]
    FfmpegMissing,

    /// Failed to spawn the ffmpeg child process.
    #[error("Failed to spawn ffmpeg: {0}")]
    Spawn(std::io::Error),

    /// A frame buffer did not match the negotiated frame size.
    #[error("Frame buffer size mismatch: expected {expected} bytes, got {actual}")]
    InvalidFrame { expected: usize, actual: usize },

    /// The encoder pipeline was already closed.
    #[error("Encoder pipeline is closed")]
    Closed,

    /// ffmpeg exited with a failure status while encoding.
    #[error("Video encode failed with {status}")]
    EncodeFailed { status: ExitStatus },

    /// ffmpeg exited with a failure status while muxing.
    #[error("Stream mux failed with {status}")]
    MuxFailed { status: ExitStatus },

    /// The mux did not complete in time and ffmpeg was killed.
    #[error("Mux timed out after {0} seconds")]
    MuxTimeout(u64),

    /// ffmpeg reported success but the output file is missing or empty.
    #[error("Encoder produced no output file: {}", .0.display())]
    MissingOutput(PathBuf),

    /// I/O error talking to the ffmpeg process.
    #[error("Encoder I/O error: {0}")]
    Io(#[from] std::io::Error),
}
