//! Post-capture muxing of the video and audio streams.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use crate::error::EncoderError;
use crate::EncoderResult;

/// How long to let the mux run before killing ffmpeg.
pub const MUX_TIMEOUT: Duration = Duration::from_secs(30);

fn build_mux_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-i".into(),
        video.display().to_string(),
        "-i".into(),
        audio.display().to_string(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        "-shortest".into(),
        "-y".into(),
        output.display().to_string(),
    ]
}

/// Whether ffmpeg can be invoked on this machine.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Merge `video` and `audio` into `output`. The video stream is copied
/// without re-encoding, the audio is encoded to AAC, and the result is
/// clipped to the shorter of the two inputs.
#[instrument(name = "mux_streams", skip_all, fields(output = %output.display()))]
pub fn mux_streams(video: &Path, audio: &Path, output: &Path) -> EncoderResult<()> {
    info!(
        video = %video.display(),
        audio = %audio.display(),
        "Muxing audio and video"
    );

    let mut child = Command::new("ffmpeg")
        .args(build_mux_args(video, audio, output))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EncoderError::FfmpegMissing,
            _ => EncoderError::Spawn(e),
        })?;

    let deadline = Instant::now() + MUX_TIMEOUT;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                warn!("Mux timed out, killing ffmpeg");
                let _ = child.kill();
                let _ = child.wait();
                return Err(EncoderError::MuxTimeout(MUX_TIMEOUT.as_secs()));
            }
            None => std::thread::sleep(Duration::from_millis(100)),
        }
    };

    if !status.success() {
        return Err(EncoderError::MuxFailed { status });
    }

    match std::fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => {
            info!("Mux complete");
            Ok(())
        }
        _ => Err(EncoderError::MissingOutput(output.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mux_args_layout() {
        let args = build_mux_args(
            Path::new("v.mp4"),
            Path::new("a.wav"),
            Path::new("out.mp4"),
        );

        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "v.mp4");
        assert_eq!(args[2], "-i");
        assert_eq!(args[3], "a.wav");
        assert!(args.windows(2).any(|w| w[0] == "-c:v" && w[1] == "copy"));
        assert!(args.windows(2).any(|w| w[0] == "-c:a" && w[1] == "aac"));
        assert!(args.iter().any(|a| a == "-shortest"));
        assert_eq!(args[args.len() - 1], "out.mp4");
    }
}
