//! Raw RGB to H.264 encoding through an ffmpeg child process.
//!
//! Frames are piped to ffmpeg's stdin as tightly packed rgb24 and encoded
//! with libx264 at the ultrafast preset, which keeps the encode ahead of
//! the capture loop on modest hardware. The frame size is fixed for the
//! lifetime of the writer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use recorder_ipc::FrameSize;
use tracing::{info, warn};

use crate::error::EncoderError;
use crate::{EncoderResult, VideoSink};

fn build_encode_args(path: &Path, size: FrameSize, fps: u32) -> Vec<String> {
    vec![
        "-y".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        format!("{}x{}", size.width, size.height),
        "-r".into(),
        fps.to_string(),
        "-i".into(),
        "pipe:0".into(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "ultrafast".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        path.display().to_string(),
    ]
}

/// Encodes a fixed-size RGB frame stream into an MP4 file.
pub struct FfmpegVideoWriter {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frame_bytes: usize,
    frames_written: u64,
    path: PathBuf,
}

impl FfmpegVideoWriter {
    /// Spawn the encode pipeline. Every frame written afterwards must be
    /// exactly `size.width * size.height * 3` bytes.
    pub fn open(path: &Path, size: FrameSize, fps: u32) -> EncoderResult<Self> {
        info!(
            path = %path.display(),
            width = size.width,
            height = size.height,
            fps,
            "Starting ffmpeg encoder"
        );

        let mut child = Command::new("ffmpeg")
            .args(build_encode_args(path, size, fps))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => EncoderError::FfmpegMissing,
                _ => EncoderError::Spawn(e),
            })?;

        let stdin = child.stdin.take().ok_or(EncoderError::Closed)?;

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            frame_bytes: size.width as usize * size.height as usize * 3,
            frames_written: 0,
            path: path.to_path_buf(),
        })
    }

    /// Number of frames accepted so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl VideoSink for FfmpegVideoWriter {
    fn write_frame(&mut self, data: &[u8]) -> EncoderResult<()> {
        if data.len() != self.frame_bytes {
            return Err(EncoderError::InvalidFrame {
                expected: self.frame_bytes,
                actual: data.len(),
            });
        }
        let stdin = self.stdin.as_mut().ok_or(EncoderError::Closed)?;
        stdin.write_all(data)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> EncoderResult<()> {
        // Closing stdin signals end of stream so ffmpeg can flush and exit.
        drop(self.stdin.take());
        let mut child = match self.child.take() {
            Some(child) => child,
            None => return Ok(()),
        };

        let status = child.wait()?;
        if !status.success() {
            return Err(EncoderError::EncodeFailed { status });
        }

        match std::fs::metadata(&self.path) {
            Ok(meta) if meta.len() > 0 => {
                info!(
                    path = %self.path.display(),
                    frames = self.frames_written,
                    "Video encode finished"
                );
                Ok(())
            }
            _ => Err(EncoderError::MissingOutput(self.path.clone())),
        }
    }
}

impl Drop for FfmpegVideoWriter {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.finish() {
                warn!("Encoder shutdown error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_args_layout() {
        let args = build_encode_args(Path::new("/tmp/out.mp4"), FrameSize::new(1280, 720), 30);

        assert_eq!(args[0], "-y");
        let s = args.iter().position(|a| a == "-s").unwrap();
        assert_eq!(args[s + 1], "1280x720");
        let r = args.iter().position(|a| a == "-r").unwrap();
        assert_eq!(args[r + 1], "30");
        assert!(args.windows(2).any(|w| w[0] == "-pix_fmt" && w[1] == "rgb24"));
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "libx264"));
        assert!(args.windows(2).any(|w| w[0] == "-i" && w[1] == "pipe:0"));
        assert_eq!(args[args.len() - 1], "/tmp/out.mp4");
    }

    #[test]
    fn test_write_frame_validates_length() {
        let mut writer = FfmpegVideoWriter {
            child: None,
            stdin: None,
            frame_bytes: 12,
            frames_written: 0,
            path: PathBuf::from("unused.mp4"),
        };

        let err = writer.write_frame(&[0u8; 5]).unwrap_err();
        assert!(matches!(
            err,
            EncoderError::InvalidFrame {
                expected: 12,
                actual: 5
            }
        ));

        // Right size but the pipeline is closed.
        let err = writer.write_frame(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, EncoderError::Closed));
    }

    #[test]
    fn test_finish_is_idempotent_without_child() {
        let mut writer = FfmpegVideoWriter {
            child: None,
            stdin: None,
            frame_bytes: 3,
            frames_written: 0,
            path: PathBuf::from("unused.mp4"),
        };
        writer.finish().unwrap();
        writer.finish().unwrap();
    }
}
