//! Recording session controller.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use recorder_audio::LoopbackRecorder;
use recorder_capture::{FrameSource, ScreenSource};
use recorder_encoder::{
    ffmpeg_available, mux_streams, EncoderError, FfmpegVideoWriter, VideoSink,
};
use recorder_ipc::{Region, SessionState, SessionStats};

use crate::capture_loop::{run_capture_loop, CaptureShared, LoopSummary};
use crate::error::SessionError;
use crate::stats::SessionCounters;
use crate::SessionResult;

/// How long to wait for the capture loop to drain and finish on stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Audio path of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioMode {
    /// No loopback device, or audio capture failed to start.
    None,
    /// System loopback audio is being captured.
    System,
}

impl AudioMode {
    pub fn name(&self) -> &'static str {
        match self {
            AudioMode::None => "none",
            AudioMode::System => "system loopback",
        }
    }
}

/// Derive the merged output path: `name.mp4` becomes `name_final.mp4`.
fn final_output_path(video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recording".to_string());
    let ext = video
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    video.with_file_name(format!("{}_final.{}", stem, ext))
}

/// Controls one recording at a time: Idle or Recording, nothing else.
///
/// `start` wires a frame source to the encoder and spawns the capture
/// loop; `stop` drains the loop, finalizes the video, and muxes in the
/// audio track when one was captured. Audio is best-effort throughout: a
/// session that cannot capture audio records video only.
pub struct RecordingSession {
    state: Mutex<SessionState>,
    shared: Arc<CaptureShared>,
    counters: Arc<SessionCounters>,
    audio: LoopbackRecorder,
    fps: u32,
    loop_thread: Mutex<Option<JoinHandle<()>>>,
    done_rx: Mutex<Option<Receiver<LoopSummary>>>,
    stop_flag: Mutex<Option<Arc<AtomicBool>>>,
    audio_mode: Mutex<AudioMode>,
    video_path: Mutex<Option<PathBuf>>,
    last_output: Mutex<Option<PathBuf>>,
    last_muxed: AtomicBool,
}

impl RecordingSession {
    /// Create an idle session targeting `fps` frames per second.
    pub fn new(fps: u32) -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            shared: Arc::new(CaptureShared::new()),
            counters: Arc::new(SessionCounters::new()),
            audio: LoopbackRecorder::new(),
            fps: fps.max(1),
            loop_thread: Mutex::new(None),
            done_rx: Mutex::new(None),
            stop_flag: Mutex::new(None),
            audio_mode: Mutex::new(AudioMode::None),
            video_path: Mutex::new(None),
            last_output: Mutex::new(None),
            last_muxed: AtomicBool::new(false),
        }
    }

    /// Start recording `region` into `output_path`.
    ///
    /// Fails without any state change when a recording is active, the
    /// region is degenerate, or ffmpeg is unavailable.
    #[instrument(name = "session_start", skip(self))]
    pub fn start(&self, region: Region, output_path: &Path) -> SessionResult<()> {
        if self.state.lock().is_recording() {
            return Err(SessionError::AlreadyRecording);
        }
        if !region.is_valid() {
            return Err(SessionError::InvalidRegion {
                width: region.width,
                height: region.height,
            });
        }
        if !ffmpeg_available() {
            return Err(SessionError::Encoder(EncoderError::FfmpegMissing));
        }

        let writer = FfmpegVideoWriter::open(output_path, region.size(), self.fps)?;
        self.start_with_sink(ScreenSource::new(), writer, region, output_path, true)
    }

    /// Start a session with explicit source and sink.
    pub(crate) fn start_with_sink<S, W>(
        &self,
        source: S,
        writer: W,
        region: Region,
        output_path: &Path,
        with_audio: bool,
    ) -> SessionResult<()>
    where
        S: FrameSource + 'static,
        W: VideoSink + 'static,
    {
        if self.state.lock().is_recording() {
            return Err(SessionError::AlreadyRecording);
        }
        if !region.is_valid() {
            return Err(SessionError::InvalidRegion {
                width: region.width,
                height: region.height,
            });
        }

        info!(
            left = region.left,
            top = region.top,
            width = region.width,
            height = region.height,
            fps = self.fps,
            "Starting recording session"
        );

        // The target size is fixed here for the whole session; later
        // region swaps only change what gets grabbed.
        *self.shared.region.lock() = Some(region);
        *self.shared.target.lock() = Some(region.size());

        self.counters.start();

        let audio_mode = if with_audio {
            self.start_audio(output_path)
        } else {
            AudioMode::None
        };
        *self.audio_mode.lock() = audio_mode;

        let should_stop = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = bounded(1);

        let shared = Arc::clone(&self.shared);
        let counters = Arc::clone(&self.counters);
        let loop_stop = Arc::clone(&should_stop);
        let fps = self.fps;
        let handle = thread::spawn(move || {
            run_capture_loop(source, writer, shared, loop_stop, counters, fps, done_tx);
        });

        *self.loop_thread.lock() = Some(handle);
        *self.done_rx.lock() = Some(done_rx);
        *self.stop_flag.lock() = Some(should_stop);
        *self.video_path.lock() = Some(output_path.to_path_buf());
        self.last_muxed.store(false, Ordering::SeqCst);

        self.set_state(SessionState::Recording);
        Ok(())
    }

    fn start_audio(&self, output_path: &Path) -> AudioMode {
        let base = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string());

        match self.audio.start(&base) {
            Ok(()) => {
                info!("System audio capture enabled");
                AudioMode::System
            }
            Err(e) => {
                info!("Recording without audio: {}", e);
                AudioMode::None
            }
        }
    }

    /// Stop the active recording and finalize the output file.
    ///
    /// Returns the path of the finished recording. When called while idle,
    /// returns the previous session's output if there is one.
    #[instrument(name = "session_stop", skip(self))]
    pub fn stop(&self) -> SessionResult<PathBuf> {
        if self.state.lock().is_idle() {
            return self
                .last_output
                .lock()
                .clone()
                .ok_or(SessionError::NotRecording);
        }

        info!("Stopping recording session");

        if let Some(flag) = self.stop_flag.lock().take() {
            flag.store(true, Ordering::SeqCst);
        }

        // Wait for the loop to drain and close the encoder, but never
        // hang the controller on a wedged pipeline.
        let summary = match self.done_rx.lock().take() {
            Some(done_rx) => match done_rx.recv_timeout(STOP_TIMEOUT) {
                Ok(summary) => Some(summary),
                Err(_) => {
                    warn!(
                        "Capture loop did not finish within {:?}, proceeding",
                        STOP_TIMEOUT
                    );
                    None
                }
            },
            None => None,
        };

        match self.loop_thread.lock().take() {
            Some(handle) if summary.is_some() => {
                let _ = handle.join();
            }
            Some(_) => debug!("Leaving capture thread to finish in the background"),
            None => {}
        }

        self.counters.stop();
        self.set_state(SessionState::Idle);

        let audio_path = self.audio.stop();
        let video_path = match self.video_path.lock().take() {
            Some(path) => path,
            None => return Err(SessionError::NotRecording),
        };

        let frames = match summary {
            Some(summary) => {
                if let Err(e) = summary.finish_result {
                    if let Some(ref audio) = audio_path {
                        let _ = std::fs::remove_file(audio);
                    }
                    return Err(e.into());
                }
                summary.frames_written
            }
            None => 0,
        };

        let output = match audio_path {
            Some(ref audio) => self.mux_outputs(&video_path, audio),
            None => {
                debug!("No audio captured, keeping video-only output");
                video_path.clone()
            }
        };

        *self.last_output.lock() = Some(output.clone());
        info!(path = %output.display(), frames, "Recording saved");
        Ok(output)
    }

    /// Mux the audio track into the video. On success the intermediate
    /// files are removed; on failure the video-only file is kept.
    fn mux_outputs(&self, video: &Path, audio: &Path) -> PathBuf {
        let merged = final_output_path(video);
        match mux_streams(video, audio, &merged) {
            Ok(()) => {
                let _ = std::fs::remove_file(video);
                let _ = std::fs::remove_file(audio);
                self.last_muxed.store(true, Ordering::SeqCst);
                merged
            }
            Err(e) => {
                warn!("Mux failed, keeping video without audio: {}", e);
                let _ = std::fs::remove_file(audio);
                video.to_path_buf()
            }
        }
    }

    /// Swap the capture region of the active recording. Takes effect on
    /// the next captured frame; the output frame size does not change.
    pub fn update_region(&self, region: Region) -> SessionResult<()> {
        if !region.is_valid() {
            return Err(SessionError::InvalidRegion {
                width: region.width,
                height: region.height,
            });
        }
        if self.state.lock().is_idle() {
            return Err(SessionError::NotRecording);
        }

        *self.shared.region.lock() = Some(region);
        debug!(
            left = region.left,
            top = region.top,
            width = region.width,
            height = region.height,
            "Capture region updated"
        );
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Region currently being captured, or the last one recorded.
    pub fn current_region(&self) -> Option<Region> {
        *self.shared.region.lock()
    }

    pub fn audio_mode(&self) -> AudioMode {
        *self.audio_mode.lock()
    }

    /// Counters for the running session, or the last finished one.
    pub fn stats(&self) -> SessionStats {
        self.counters.snapshot()
    }

    /// Whether the last stop merged audio into the output.
    pub fn last_mux_succeeded(&self) -> bool {
        self.last_muxed.load(Ordering::SeqCst)
    }

    fn set_state(&self, new_state: SessionState) {
        let previous = {
            let mut state = self.state.lock();
            let prev = *state;
            *state = new_state;
            prev
        };
        debug!(
            previous = %previous.name(),
            current = %new_state.name(),
            "Session state change"
        );
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.state.lock().is_recording() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bytes::Bytes;

    use recorder_capture::{CaptureResult, RgbFrame};
    use recorder_encoder::EncoderResult;

    struct TestSource;

    impl FrameSource for TestSource {
        fn grab(&mut self, region: Region) -> CaptureResult<RgbFrame> {
            let data = vec![0u8; (region.width * region.height * 3) as usize];
            RgbFrame::new(Bytes::from(data), region.width, region.height)
        }
    }

    struct TestSink {
        frame_lens: Arc<Mutex<Vec<usize>>>,
    }

    impl TestSink {
        fn new() -> (Self, Arc<Mutex<Vec<usize>>>) {
            let lens = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    frame_lens: Arc::clone(&lens),
                },
                lens,
            )
        }
    }

    impl VideoSink for TestSink {
        fn write_frame(&mut self, data: &[u8]) -> EncoderResult<()> {
            self.frame_lens.lock().push(data.len());
            Ok(())
        }

        fn finish(&mut self) -> EncoderResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_stop_without_recording_errors() {
        let session = RecordingSession::new(30);
        assert!(matches!(session.stop(), Err(SessionError::NotRecording)));
    }

    #[test]
    fn test_update_region_requires_recording() {
        let session = RecordingSession::new(30);
        let err = session
            .update_region(Region::new(0, 0, 100, 100))
            .unwrap_err();
        assert!(matches!(err, SessionError::NotRecording));
        assert_eq!(session.current_region(), None);
    }

    #[test]
    fn test_session_lifecycle() {
        let session = RecordingSession::new(60);
        let (sink, lens) = TestSink::new();
        let output = PathBuf::from("lifecycle_test.mp4");

        session
            .start_with_sink(TestSource, sink, Region::new(0, 0, 64, 48), &output, false)
            .unwrap();
        assert_eq!(session.state(), SessionState::Recording);
        assert_eq!(session.audio_mode(), AudioMode::None);

        thread::sleep(Duration::from_millis(100));
        session.update_region(Region::new(5, 5, 32, 32)).unwrap();
        assert_eq!(session.current_region(), Some(Region::new(5, 5, 32, 32)));
        thread::sleep(Duration::from_millis(100));

        let saved = session.stop().unwrap();
        assert_eq!(saved, output);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.stats().frames_written >= 1);

        // Every encoded frame keeps the size fixed at start.
        assert!(lens.lock().iter().all(|&len| len == 64 * 48 * 3));

        // Stopping again reports the finished recording.
        assert_eq!(session.stop().unwrap(), output);
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let session = RecordingSession::new(30);
        let (sink, _lens) = TestSink::new();
        let region = Region::new(0, 0, 64, 64);
        let output = PathBuf::from("double_start.mp4");

        session
            .start_with_sink(TestSource, sink, region, &output, false)
            .unwrap();

        let (second_sink, _) = TestSink::new();
        let err = session
            .start_with_sink(TestSource, second_sink, region, &output, false)
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRecording));

        session.stop().unwrap();
    }

    #[test]
    fn test_degenerate_region_is_rejected() {
        let session = RecordingSession::new(30);
        let (sink, _lens) = TestSink::new();

        let err = session
            .start_with_sink(
                TestSource,
                sink,
                Region::new(0, 0, 0, 100),
                Path::new("never.mp4"),
                false,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidRegion {
                width: 0,
                height: 100
            }
        ));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(matches!(session.stop(), Err(SessionError::NotRecording)));
    }

    #[test]
    fn test_final_output_path_naming() {
        assert_eq!(
            final_output_path(Path::new("/tmp/rec.mp4")),
            PathBuf::from("/tmp/rec_final.mp4")
        );
        assert_eq!(
            final_output_path(Path::new("clip.mkv")),
            PathBuf::from("clip_final.mkv")
        );
        assert_eq!(
            final_output_path(Path::new("bare")),
            PathBuf::from("bare_final.mp4")
        );
    }

    #[test]
    fn test_audio_mode_names() {
        assert_eq!(AudioMode::None.name(), "none");
        assert_eq!(AudioMode::System.name(), "system loopback");
    }
}
