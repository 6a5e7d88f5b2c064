//! Display and window capture for the recorder.
//!
//! This crate wraps the screenshot backend to grab arbitrary desktop regions
//! as RGB frames and to enumerate monitors and windows.

mod error;
mod frame;
mod screen;
mod window;

pub use error::CaptureError;
pub use frame::RgbFrame;
pub use screen::{enumerate_monitors, virtual_desktop, MonitorInfo, ScreenSource};
pub use window::{enumerate_windows, WindowInfo};

use recorder_ipc::Region;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Trait for sources the capture loop pulls frames from.
pub trait FrameSource: Send {
    /// Grab one frame covering the given desktop region.
    ///
    /// The returned frame may be smaller than the region when the region
    /// extends past the display edge.
    fn grab(&mut self, region: Region) -> CaptureResult<RgbFrame>;
}
