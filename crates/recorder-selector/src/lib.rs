//! Capture target selection.
//!
//! Two ways to pick what gets recorded: a drag selector that turns
//! press/motion/release input into a desktop region, and a window picker
//! that lists open windows and maps a choice to its bounding region. Both
//! produce a [`recorder_ipc::Region`] and leave capture to the engine.

mod drag;
mod picker;

pub use drag::{DragPhase, RegionDrag};
pub use picker::WindowPicker;

/// Selections smaller than this in either dimension are rejected.
pub const MIN_SELECTION_SIZE: u32 = 50;
