//! Session counters and reporting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;

use recorder_ipc::SessionStats;

/// Counters shared between the capture loop and the session controller.
///
/// While a session runs, the elapsed clock tracks wall time since start;
/// after `stop` it freezes so snapshots keep reporting the finished
/// session.
pub struct SessionCounters {
    start_time: RwLock<Option<Instant>>,
    finished_elapsed: RwLock<f64>,
    frames_written: AtomicU64,
    capture_errors: AtomicU64,
    pacing_overruns: AtomicU64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self {
            start_time: RwLock::new(None),
            finished_elapsed: RwLock::new(0.0),
            frames_written: AtomicU64::new(0),
            capture_errors: AtomicU64::new(0),
            pacing_overruns: AtomicU64::new(0),
        }
    }

    /// Mark the start of a session, resetting all counters.
    pub fn start(&self) {
        self.frames_written.store(0, Ordering::Relaxed);
        self.capture_errors.store(0, Ordering::Relaxed);
        self.pacing_overruns.store(0, Ordering::Relaxed);
        *self.finished_elapsed.write() = 0.0;
        *self.start_time.write() = Some(Instant::now());
    }

    /// Freeze the elapsed clock at session end.
    pub fn stop(&self) {
        let mut start = self.start_time.write();
        if let Some(started) = start.take() {
            *self.finished_elapsed.write() = started.elapsed().as_secs_f64();
        }
    }

    /// Record a frame handed to the encoder.
    pub fn record_frame(&self) {
        self.frames_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed frame grab.
    pub fn record_capture_error(&self) {
        self.capture_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an iteration that overran its frame interval.
    pub fn record_overrun(&self) {
        self.pacing_overruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counters as a reportable snapshot.
    pub fn snapshot(&self) -> SessionStats {
        let elapsed_seconds = match *self.start_time.read() {
            Some(started) => started.elapsed().as_secs_f64(),
            None => *self.finished_elapsed.read(),
        };

        let frames_written = self.frames_written.load(Ordering::Relaxed);
        let achieved_fps = if elapsed_seconds > 0.0 {
            (frames_written as f64 / elapsed_seconds) as f32
        } else {
            0.0
        };

        SessionStats {
            frames_written,
            capture_errors: self.capture_errors.load(Ordering::Relaxed),
            pacing_overruns: self.pacing_overruns.load(Ordering::Relaxed),
            elapsed_seconds,
            achieved_fps,
        }
    }
}

impl Default for SessionCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_counters_accumulate() {
        let counters = SessionCounters::new();
        counters.start();
        counters.record_frame();
        counters.record_frame();
        counters.record_frame();
        counters.record_capture_error();
        counters.record_overrun();

        let stats = counters.snapshot();
        assert_eq!(stats.frames_written, 3);
        assert_eq!(stats.capture_errors, 1);
        assert_eq!(stats.pacing_overruns, 1);
    }

    #[test]
    fn test_start_resets_counters() {
        let counters = SessionCounters::new();
        counters.start();
        counters.record_frame();
        counters.stop();

        counters.start();
        assert_eq!(counters.snapshot().frames_written, 0);
    }

    #[test]
    fn test_elapsed_freezes_after_stop() {
        let counters = SessionCounters::new();
        counters.start();
        std::thread::sleep(Duration::from_millis(20));
        counters.stop();

        let first = counters.snapshot().elapsed_seconds;
        std::thread::sleep(Duration::from_millis(20));
        let second = counters.snapshot().elapsed_seconds;

        assert!(first > 0.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_snapshot_before_start_is_zeroed() {
        let stats = SessionCounters::new().snapshot();
        assert_eq!(stats.frames_written, 0);
        assert_eq!(stats.elapsed_seconds, 0.0);
        assert_eq!(stats.achieved_fps, 0.0);
    }
}
