//! Window selection list.

use recorder_capture::{enumerate_windows, CaptureResult, WindowInfo};
use recorder_ipc::{Region, WindowTarget};
use tracing::debug;

/// Titles longer than this are truncated in picker labels.
const MAX_TITLE_CHARS: usize = 50;

fn picker_label(title: &str, width: u32, height: u32) -> String {
    let mut shown: String = title.chars().take(MAX_TITLE_CHARS).collect();
    if title.chars().count() > MAX_TITLE_CHARS {
        shown.push_str("...");
    }
    format!("{} ({}x{})", shown, width, height)
}

fn build_entries(windows: Vec<WindowInfo>, exclude_marker: Option<&str>) -> Vec<WindowTarget> {
    let mut entries = Vec::with_capacity(windows.len());
    for window in windows {
        if let Some(marker) = exclude_marker {
            if window.title.contains(marker) {
                continue;
            }
        }
        let label = picker_label(&window.title, window.bounds.width, window.bounds.height);
        entries.push(WindowTarget {
            id: window.id,
            title: window.title,
            region: window.bounds,
            label,
        });
    }
    entries
}

/// Lists capturable windows and resolves a choice to its screen region.
#[derive(Debug, Default)]
pub struct WindowPicker {
    entries: Vec<WindowTarget>,
    exclude_marker: Option<String>,
}

impl WindowPicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide windows whose title contains `marker`. Keeps the recorder's
    /// own windows out of the list.
    pub fn with_exclude_marker(marker: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            exclude_marker: Some(marker.into()),
        }
    }

    /// Re-enumerate the desktop's windows, replacing the current entries.
    /// Returns the number of windows listed.
    pub fn refresh(&mut self) -> CaptureResult<usize> {
        let windows = enumerate_windows()?;
        self.entries = build_entries(windows, self.exclude_marker.as_deref());
        debug!(count = self.entries.len(), "Window picker refreshed");
        Ok(self.entries.len())
    }

    /// Entries in enumeration order, labelled for display.
    pub fn entries(&self) -> &[WindowTarget] {
        &self.entries
    }

    /// Screen region of the entry at `index`.
    pub fn choose(&self, index: usize) -> Option<Region> {
        self.entries.get(index).map(|entry| entry.region)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
