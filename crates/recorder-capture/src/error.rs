//! Error types for the capture module.

use thiserror::Error;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Capture backend error.
    #[error("Capture backend error: {0}")]
    Backend(#[from] xcap::XCapError),

    /// No monitors are attached.
    #[error("No monitors available")]
    NoMonitors,

    /// The requested region does not overlap any monitor.
    #[error("Region at ({left}, {top}) does not overlap any monitor")]
    MonitorNotFound {
        /// Region left edge.
        left: i32,
        /// Region top edge.
        top: i32,
    },

    /// The requested region has a zero dimension.
    #[error("Invalid capture region: {width}x{height}")]
    InvalidRegion {
        /// Region width.
        width: u32,
        /// Region height.
        height: u32,
    },

    /// Frame conversion error.
    #[error("Frame conversion error: {0}")]
    FrameConversion(String),
}
