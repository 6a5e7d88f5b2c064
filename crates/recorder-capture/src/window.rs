//! Window enumeration for capture.

use tracing::{debug, instrument};
use xcap::Window;

use recorder_ipc::Region;

use crate::CaptureResult;

/// Window information for capture.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    /// Backend window identifier.
    pub id: u32,

    /// Window title.
    pub title: String,

    /// Owning application name.
    pub app_name: String,

    /// On-screen bounding box in desktop coordinates.
    pub bounds: Region,
}

/// Enumerate all visible windows suitable for capture.
///
/// Minimized windows, windows without a title, and zero-sized windows are
/// skipped.
#[instrument(name = "enumerate_windows")]
pub fn enumerate_windows() -> CaptureResult<Vec<WindowInfo>> {
    let mut windows: Vec<WindowInfo> = Vec::new();

    for window in Window::all()? {
        if window.is_minimized() {
            continue;
        }

        let title = window.title().to_string();
        if title.trim().is_empty() {
            continue;
        }

        let width = window.width();
        let height = window.height();
        if width == 0 || height == 0 {
            continue;
        }

        windows.push(WindowInfo {
            id: window.id(),
            title,
            app_name: window.app_name().to_string(),
            bounds: Region::new(window.x(), window.y(), width, height),
        });
    }

    debug!(count = windows.len(), "Enumerated windows");
    Ok(windows)
}
