//! Video encoding and stream muxing via an external ffmpeg process.
//!
//! Encoding pipes raw RGB frames into a spawned ffmpeg child; muxing runs
//! a second ffmpeg pass that merges the finished video with the captured
//! audio track. Nothing here links against codec libraries, so the only
//! runtime requirement is an ffmpeg binary on PATH.

mod error;
mod mux;
mod writer;

pub use error::EncoderError;
pub use mux::{ffmpeg_available, mux_streams, MUX_TIMEOUT};
pub use writer::FfmpegVideoWriter;

/// Result type for encoder operations.
pub type EncoderResult<T> = Result<T, EncoderError>;

/// Destination for raw RGB frames.
///
/// The capture loop writes through this trait, which lets tests swap the
/// ffmpeg pipeline for an in-memory sink.
pub trait VideoSink: Send {
    /// Append one tightly packed rgb24 frame.
    fn write_frame(&mut self, data: &[u8]) -> EncoderResult<()>;

    /// Flush pending frames and close the sink. Safe to call twice.
    fn finish(&mut self) -> EncoderResult<()>;
}
