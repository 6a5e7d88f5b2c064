//! The frame capture and encode loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use recorder_capture::FrameSource;
use recorder_encoder::{EncoderResult, VideoSink};
use recorder_ipc::{FrameSize, Region};

use crate::stats::SessionCounters;

/// How long to idle after an iteration that produced no frame.
const IDLE_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Interval between periodic progress log lines.
const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration the capture loop re-reads every iteration.
///
/// The region and the target frame size sit behind separate locks so a
/// region swap never contends with anything else, and the loop copies both
/// out before grabbing so neither lock is held during capture or encode.
pub(crate) struct CaptureShared {
    /// Capture region, swappable mid-session.
    pub region: Mutex<Option<Region>>,
    /// Output frame size, fixed at session start.
    pub target: Mutex<Option<FrameSize>>,
}

impl CaptureShared {
    pub fn new() -> Self {
        Self {
            region: Mutex::new(None),
            target: Mutex::new(None),
        }
    }
}

/// What the capture loop hands back when it exits.
pub(crate) struct LoopSummary {
    pub frames_written: u64,
    pub finish_result: EncoderResult<()>,
}

/// Grab, scale, and encode frames until told to stop.
///
/// Every frame written to `writer` has exactly the target frame size, no
/// matter how the region changes mid-session. A grab failure is counted
/// and retried; a writer failure ends the loop. The writer is always
/// finished before the summary is sent.
pub(crate) fn run_capture_loop<S, W>(
    mut source: S,
    mut writer: W,
    shared: Arc<CaptureShared>,
    should_stop: Arc<AtomicBool>,
    counters: Arc<SessionCounters>,
    fps: u32,
    done_tx: Sender<LoopSummary>,
) where
    S: FrameSource,
    W: VideoSink,
{
    debug!("Capture loop starting");

    let frame_interval = Duration::from_nanos(1_000_000_000 / u64::from(fps.max(1)));
    let mut frames_written: u64 = 0;
    let mut last_log_time = Instant::now();

    while !should_stop.load(Ordering::SeqCst) {
        let frame_start = Instant::now();

        if last_log_time.elapsed() >= PROGRESS_LOG_INTERVAL {
            let stats = counters.snapshot();
            info!(
                "Recording stats: frames={}, errors={}, overruns={}, fps={:.1}",
                stats.frames_written, stats.capture_errors, stats.pacing_overruns, stats.achieved_fps
            );
            last_log_time = Instant::now();
        }

        // Copy the configuration out under short, separate locks.
        let region = *shared.region.lock();
        let target = *shared.target.lock();

        let (region, target) = match (region, target) {
            (Some(region), Some(target)) => (region, target),
            _ => {
                thread::sleep(IDLE_RETRY_DELAY);
                continue;
            }
        };

        let frame = match source.grab(region) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame grab failed: {}", e);
                counters.record_capture_error();
                thread::sleep(IDLE_RETRY_DELAY);
                continue;
            }
        };

        // Scale to the session's fixed output size. The grab may come back
        // smaller than the region when it was clamped at a display edge.
        let frame = match frame.resized(target) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame conversion failed: {}", e);
                counters.record_capture_error();
                thread::sleep(IDLE_RETRY_DELAY);
                continue;
            }
        };

        match writer.write_frame(&frame.data) {
            Ok(()) => {
                frames_written += 1;
                counters.record_frame();
            }
            Err(e) => {
                error!("Encoder rejected frame, ending capture: {}", e);
                break;
            }
        }

        // Pace to the target rate; an iteration that ran long skips its
        // sleep and is counted as an overrun.
        let elapsed = frame_start.elapsed();
        if elapsed < frame_interval {
            thread::sleep(frame_interval - elapsed);
        } else {
            counters.record_overrun();
        }
    }

    let finish_result = writer.finish();
    info!(frames = frames_written, "Capture loop stopped");

    if done_tx
        .send(LoopSummary {
            frames_written,
            finish_result,
        })
        .is_err()
    {
        warn!("Session no longer waiting for capture loop result");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use bytes::Bytes;
    use crossbeam_channel::bounded;

    use recorder_capture::{CaptureResult, RgbFrame};
    use recorder_encoder::EncoderError;

    struct FakeSource {
        shared: Arc<CaptureShared>,
        locks_free: Arc<AtomicBool>,
        grabs: Arc<AtomicUsize>,
    }

    impl FrameSource for FakeSource {
        fn grab(&mut self, region: Region) -> CaptureResult<RgbFrame> {
            self.grabs.fetch_add(1, Ordering::SeqCst);
            let region_free = self.shared.region.try_lock().is_some();
            let target_free = self.shared.target.try_lock().is_some();
            if !(region_free && target_free) {
                self.locks_free.store(false, Ordering::SeqCst);
            }
            let data = vec![0u8; (region.width * region.height * 3) as usize];
            RgbFrame::new(Bytes::from(data), region.width, region.height)
        }
    }

    struct FakeSink {
        frame_lens: Arc<Mutex<Vec<usize>>>,
        fail_after: Option<usize>,
        finished: Arc<AtomicBool>,
    }

    impl VideoSink for FakeSink {
        fn write_frame(&mut self, data: &[u8]) -> EncoderResult<()> {
            let mut lens = self.frame_lens.lock();
            if let Some(limit) = self.fail_after {
                if lens.len() >= limit {
                    return Err(EncoderError::Closed);
                }
            }
            lens.push(data.len());
            Ok(())
        }

        fn finish(&mut self) -> EncoderResult<()> {
            self.finished.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct LoopHarness {
        shared: Arc<CaptureShared>,
        should_stop: Arc<AtomicBool>,
        counters: Arc<SessionCounters>,
        frame_lens: Arc<Mutex<Vec<usize>>>,
        finished: Arc<AtomicBool>,
        locks_free: Arc<AtomicBool>,
        grabs: Arc<AtomicUsize>,
    }

    impl LoopHarness {
        fn new(region: Option<Region>) -> Self {
            let shared = Arc::new(CaptureShared::new());
            if let Some(region) = region {
                *shared.region.lock() = Some(region);
                *shared.target.lock() = Some(region.size());
            }
            let counters = Arc::new(SessionCounters::new());
            counters.start();
            Self {
                shared,
                should_stop: Arc::new(AtomicBool::new(false)),
                counters,
                frame_lens: Arc::new(Mutex::new(Vec::new())),
                finished: Arc::new(AtomicBool::new(false)),
                locks_free: Arc::new(AtomicBool::new(true)),
                grabs: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn spawn(
            &self,
            fps: u32,
            fail_after: Option<usize>,
        ) -> (
            std::thread::JoinHandle<()>,
            crossbeam_channel::Receiver<LoopSummary>,
        ) {
            let source = FakeSource {
                shared: Arc::clone(&self.shared),
                locks_free: Arc::clone(&self.locks_free),
                grabs: Arc::clone(&self.grabs),
            };
            let sink = FakeSink {
                frame_lens: Arc::clone(&self.frame_lens),
                fail_after,
                finished: Arc::clone(&self.finished),
            };
            let (done_tx, done_rx) = bounded(1);
            let shared = Arc::clone(&self.shared);
            let should_stop = Arc::clone(&self.should_stop);
            let counters = Arc::clone(&self.counters);
            let handle = thread::spawn(move || {
                run_capture_loop(source, sink, shared, should_stop, counters, fps, done_tx);
            });
            (handle, done_rx)
        }
    }

    #[test]
    fn test_output_size_fixed_across_region_updates() {
        let harness = LoopHarness::new(Some(Region::new(0, 0, 64, 48)));
        let (handle, done_rx) = harness.spawn(120, None);

        thread::sleep(Duration::from_millis(80));
        *harness.shared.region.lock() = Some(Region::new(10, 10, 32, 32));
        thread::sleep(Duration::from_millis(80));

        harness.should_stop.store(true, Ordering::SeqCst);
        let summary = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.join().unwrap();

        assert!(summary.finish_result.is_ok());
        assert!(summary.frames_written >= 2);
        let lens = harness.frame_lens.lock();
        assert!(lens.iter().all(|&len| len == 64 * 48 * 3));
    }

    #[test]
    fn test_config_locks_free_during_grab() {
        let harness = LoopHarness::new(Some(Region::new(0, 0, 16, 16)));
        let (handle, done_rx) = harness.spawn(120, None);

        thread::sleep(Duration::from_millis(100));
        harness.should_stop.store(true, Ordering::SeqCst);
        done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.join().unwrap();

        assert!(harness.grabs.load(Ordering::SeqCst) > 0);
        assert!(harness.locks_free.load(Ordering::SeqCst));
    }

    #[test]
    fn test_unconfigured_loop_writes_nothing() {
        let harness = LoopHarness::new(None);
        let (handle, done_rx) = harness.spawn(30, None);

        thread::sleep(Duration::from_millis(50));
        harness.should_stop.store(true, Ordering::SeqCst);
        let summary = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.join().unwrap();

        assert_eq!(summary.frames_written, 0);
        assert!(harness.frame_lens.lock().is_empty());
        assert!(harness.finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_writer_error_ends_loop() {
        let harness = LoopHarness::new(Some(Region::new(0, 0, 16, 16)));
        let (handle, done_rx) = harness.spawn(120, Some(2));

        // No stop signal: the loop must end on its own after the writer
        // starts rejecting frames.
        let summary = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.join().unwrap();

        assert_eq!(summary.frames_written, 2);
        assert!(harness.finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_pacing_approximates_target_rate() {
        let harness = LoopHarness::new(Some(Region::new(0, 0, 16, 16)));
        let (handle, done_rx) = harness.spawn(30, None);

        thread::sleep(Duration::from_millis(500));
        harness.should_stop.store(true, Ordering::SeqCst);
        let summary = done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        handle.join().unwrap();

        // Roughly 15 frames at 30 fps over half a second; wide bounds to
        // tolerate scheduler jitter.
        assert!(
            (5..=25).contains(&summary.frames_written),
            "unexpected frame count {}",
            summary.frames_written
        );
    }
}
