//! Captured frame types.

use bytes::Bytes;
use xcap::image::imageops::{self, FilterType};
use xcap::image::RgbImage;

use recorder_ipc::FrameSize;

use crate::error::CaptureError;
use crate::CaptureResult;

/// A captured video frame in packed RGB24 layout.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    /// RGB pixel data, 3 bytes per pixel, rows top to bottom.
    pub data: Bytes,

    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,
}

impl RgbFrame {
    /// Create a frame from RGB data, validating the buffer length.
    pub fn new(data: Bytes, width: u32, height: u32) -> CaptureResult<Self> {
        let expected = Self::rgb_buffer_size(width, height);
        if data.len() != expected {
            return Err(CaptureError::FrameConversion(format!(
                "RGB buffer is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Create a frame from RGBA data by dropping the alpha channel.
    pub fn from_rgba(rgba: &[u8], width: u32, height: u32) -> CaptureResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(CaptureError::FrameConversion(format!(
                "RGBA buffer is {} bytes, expected {} for {}x{}",
                rgba.len(),
                expected,
                width,
                height
            )));
        }

        let mut rgb = Vec::with_capacity(expected / 4 * 3);
        for pixel in rgba.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
        }

        Ok(Self {
            data: Bytes::from(rgb),
            width,
            height,
        })
    }

    /// Calculate expected RGB24 buffer size for given dimensions.
    pub fn rgb_buffer_size(width: u32, height: u32) -> usize {
        (width as usize) * (height as usize) * 3
    }

    /// Validate that the frame data matches expected dimensions.
    pub fn is_valid(&self) -> bool {
        self.data.len() == Self::rgb_buffer_size(self.width, self.height)
    }

    /// The frame's dimensions.
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// Resample the frame to the target size with bilinear filtering.
    ///
    /// Returns the frame unchanged when the dimensions already match.
    pub fn resized(&self, target: FrameSize) -> CaptureResult<RgbFrame> {
        if self.width == target.width && self.height == target.height {
            return Ok(self.clone());
        }

        let image = RgbImage::from_raw(self.width, self.height, self.data.to_vec()).ok_or_else(
            || {
                CaptureError::FrameConversion(format!(
                    "frame buffer does not match {}x{}",
                    self.width, self.height
                ))
            },
        )?;
        let resized = imageops::resize(&image, target.width, target.height, FilterType::Triangle);

        Ok(RgbFrame {
            data: Bytes::from(resized.into_raw()),
            width: target.width,
            height: target.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_buffer_size() {
        assert_eq!(RgbFrame::rgb_buffer_size(640, 480), 640 * 480 * 3);
        assert_eq!(RgbFrame::rgb_buffer_size(1, 1), 3);
    }

    #[test]
    fn test_from_rgba_drops_alpha() {
        // Two pixels: opaque red, translucent green
        let rgba = [255u8, 0, 0, 255, 0, 255, 0, 128];
        let frame = RgbFrame::from_rgba(&rgba, 2, 1).unwrap();
        assert_eq!(&frame.data[..], &[255, 0, 0, 0, 255, 0]);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_from_rgba_rejects_wrong_length() {
        let rgba = [0u8; 10];
        assert!(RgbFrame::from_rgba(&rgba, 2, 1).is_err());
    }

    #[test]
    fn test_new_validates_length() {
        let data = Bytes::from(vec![0u8; 12]);
        assert!(RgbFrame::new(data.clone(), 2, 2).is_ok());
        assert!(RgbFrame::new(data, 3, 2).is_err());
    }

    #[test]
    fn test_resized_changes_dimensions() {
        let data = Bytes::from(vec![128u8; 8 * 4 * 3]);
        let frame = RgbFrame::new(data, 8, 4).unwrap();

        let resized = frame.resized(FrameSize::new(4, 2)).unwrap();
        assert_eq!(resized.width, 4);
        assert_eq!(resized.height, 2);
        assert_eq!(resized.data.len(), RgbFrame::rgb_buffer_size(4, 2));
    }

    #[test]
    fn test_resized_noop_when_sizes_match() {
        let data = Bytes::from(vec![7u8; 4 * 4 * 3]);
        let frame = RgbFrame::new(data.clone(), 4, 4).unwrap();

        let same = frame.resized(FrameSize::new(4, 4)).unwrap();
        assert_eq!(same.data, data);
    }
}
