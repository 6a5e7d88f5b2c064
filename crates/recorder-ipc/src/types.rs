//! Common types used across IPC messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A rectangular capture region in absolute desktop coordinates.
///
/// The origin can be negative on multi-monitor setups where a secondary
/// monitor extends left of or above the primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Left edge in desktop coordinates.
    pub left: i32,

    /// Top edge in desktop coordinates.
    pub top: i32,

    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Creates a region from its top-left corner and extent.
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Creates a normalized region from two opposite corners in any order.
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Self {
        let left = a.0.min(b.0);
        let top = a.1.min(b.1);
        let width = (a.0 - b.0).unsigned_abs();
        let height = (a.1 - b.1).unsigned_abs();
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge (exclusive) in desktop coordinates.
    pub fn right(&self) -> i32 {
        self.left + self.width as i32
    }

    /// Bottom edge (exclusive) in desktop coordinates.
    pub fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }

    /// The region's extent as a frame size.
    pub fn size(&self) -> FrameSize {
        FrameSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Returns true if both dimensions are nonzero.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns the overlap with another region, or None if they are disjoint.
    pub fn intersection(&self, other: &Region) -> Option<Region> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return None;
        }
        Some(Region {
            left,
            top,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns the same rectangle shifted by an offset.
    pub fn translated(&self, dx: i32, dy: i32) -> Region {
        Region {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

/// Fixed pixel dimensions of the output video stream.
///
/// Established once at session start; every captured frame is resampled to
/// this size regardless of later region changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Creates a frame size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Configuration for a recording session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Target capture frame rate.
    pub fps: u32,

    /// Directory where finished recordings are placed.
    pub output_dir: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            output_dir: PathBuf::from("recordings"),
        }
    }
}

/// Counters describing a recording session's progress.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames appended to the video stream.
    pub frames_written: u64,

    /// Capture attempts that failed and were retried.
    pub capture_errors: u64,

    /// Iterations that exceeded the frame interval.
    pub pacing_overruns: u64,

    /// Seconds since the session started.
    pub elapsed_seconds: f64,

    /// Frames written divided by elapsed time.
    pub achieved_fps: f32,
}

/// A selectable window, as presented by the window picker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowTarget {
    /// Backend window identifier.
    pub id: u32,

    /// Full window title.
    pub title: String,

    /// On-screen bounding box in desktop coordinates.
    pub region: Region,

    /// Display label, e.g. `"Editor (1280x720)"`.
    pub label: String,
}

/// A candidate loopback audio device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    /// Device name as reported by the audio host.
    pub name: String,

    /// Number of input channels.
    pub channels: u16,

    /// Preferred sample rate in Hz.
    pub sample_rate: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_corners_normalizes() {
        // Drag from bottom-right to top-left
        let region = Region::from_corners((100, 80), (20, 10));
        assert_eq!(region, Region::new(20, 10, 80, 70));
    }

    #[test]
    fn test_region_intersection() {
        let a = Region::new(0, 0, 100, 100);
        let b = Region::new(50, 50, 100, 100);
        assert_eq!(a.intersection(&b), Some(Region::new(50, 50, 50, 50)));

        let c = Region::new(200, 200, 10, 10);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn test_region_negative_origin() {
        let region = Region::new(-1920, -200, 1920, 1080);
        assert_eq!(region.right(), 0);
        assert_eq!(region.bottom(), 880);
        assert!(region.is_valid());
    }

    #[test]
    fn test_region_zero_sized_is_invalid() {
        assert!(!Region::new(0, 0, 0, 100).is_valid());
        assert!(!Region::new(0, 0, 100, 0).is_valid());
    }
}
