//! Monitor enumeration and region grabbing.

use tracing::{debug, instrument};
use xcap::image::imageops;
use xcap::Monitor;

use recorder_ipc::Region;

use crate::error::CaptureError;
use crate::frame::RgbFrame;
use crate::{CaptureResult, FrameSource};

/// Monitor information for capture.
#[derive(Debug, Clone)]
pub struct MonitorInfo {
    /// Backend monitor identifier.
    pub id: u32,

    /// Monitor name/device path.
    pub name: String,

    /// Monitor bounds in desktop coordinates.
    pub bounds: Region,

    /// Whether this is the primary monitor.
    pub is_primary: bool,
}

/// Enumerate all available monitors.
#[instrument(name = "enumerate_monitors")]
pub fn enumerate_monitors() -> CaptureResult<Vec<MonitorInfo>> {
    let monitors: Vec<MonitorInfo> = Monitor::all()?
        .iter()
        .map(|monitor| MonitorInfo {
            id: monitor.id(),
            name: monitor.name().to_string(),
            bounds: monitor_bounds(monitor),
            is_primary: monitor.is_primary(),
        })
        .collect();

    debug!(count = monitors.len(), "Enumerated monitors");
    Ok(monitors)
}

/// The bounding rectangle of all monitors.
///
/// Its origin is the top-left of the leftmost/topmost monitor and can be
/// negative relative to the primary monitor.
pub fn virtual_desktop() -> CaptureResult<Region> {
    let monitors = enumerate_monitors()?;
    let bounds: Vec<Region> = monitors.iter().map(|m| m.bounds).collect();
    desktop_bounds(&bounds).ok_or(CaptureError::NoMonitors)
}

fn desktop_bounds(bounds: &[Region]) -> Option<Region> {
    let mut union = *bounds.first()?;
    for rect in &bounds[1..] {
        let left = union.left.min(rect.left);
        let top = union.top.min(rect.top);
        let right = union.right().max(rect.right());
        let bottom = union.bottom().max(rect.bottom());
        union = Region::new(left, top, (right - left) as u32, (bottom - top) as u32);
    }
    Some(union)
}

fn monitor_bounds(monitor: &Monitor) -> Region {
    Region::new(monitor.x(), monitor.y(), monitor.width(), monitor.height())
}

/// Picks the monitor whose bounds overlap the region the most.
///
/// Returns the winning index and the region clamped to that monitor.
fn pick_monitor(region: &Region, bounds: &[Region]) -> Option<(usize, Region)> {
    let mut best: Option<(usize, Region)> = None;
    for (index, monitor) in bounds.iter().enumerate() {
        if let Some(overlap) = region.intersection(monitor) {
            let better = best
                .as_ref()
                .map_or(true, |(_, current)| overlap.area() > current.area());
            if better {
                best = Some((index, overlap));
            }
        }
    }
    best
}

/// Grabs frames from the display via the screenshot backend.
///
/// Each grab re-resolves the monitor containing the region, so the region may
/// move across monitors between frames.
#[derive(Debug, Default)]
pub struct ScreenSource;

impl ScreenSource {
    /// Create a screen source.
    pub fn new() -> Self {
        Self
    }
}

impl FrameSource for ScreenSource {
    fn grab(&mut self, region: Region) -> CaptureResult<RgbFrame> {
        if !region.is_valid() {
            return Err(CaptureError::InvalidRegion {
                width: region.width,
                height: region.height,
            });
        }

        let monitors = Monitor::all()?;
        if monitors.is_empty() {
            return Err(CaptureError::NoMonitors);
        }

        let bounds: Vec<Region> = monitors.iter().map(monitor_bounds).collect();
        let (index, clamped) =
            pick_monitor(&region, &bounds).ok_or(CaptureError::MonitorNotFound {
                left: region.left,
                top: region.top,
            })?;
        let monitor = &monitors[index];

        let mut image = monitor.capture_image()?;

        // Crop offsets are relative to the monitor origin. The captured image
        // can be larger than the logical monitor size on scaled displays, so
        // clamp against the actual pixel dimensions.
        let crop_x = (clamped.left - monitor.x()) as u32;
        let crop_y = (clamped.top - monitor.y()) as u32;
        let crop_w = clamped.width.min(image.width().saturating_sub(crop_x));
        let crop_h = clamped.height.min(image.height().saturating_sub(crop_y));
        if crop_w == 0 || crop_h == 0 {
            return Err(CaptureError::MonitorNotFound {
                left: region.left,
                top: region.top,
            });
        }

        let cropped = imageops::crop(&mut image, crop_x, crop_y, crop_w, crop_h).to_image();
        RgbFrame::from_rgba(cropped.as_raw(), crop_w, crop_h)
    }
}
