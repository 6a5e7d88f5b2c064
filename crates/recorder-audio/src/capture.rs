//! System audio capture session.
//!
//! cpal streams are not `Send`, so the stream lives entirely on a dedicated
//! capture thread. The session object only holds the shared sample buffer,
//! the stop flag, and the thread handle, which keeps it safe to move across
//! threads together with the rest of the recording state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat};
use crossbeam_channel::{bounded, Sender};
use hound::{WavSpec, WavWriter};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::device::find_loopback_device;
use crate::error::AudioError;
use crate::{AudioResult, FALLBACK_SAMPLE_RATE, MAX_CAPTURE_CHANNELS, START_TIMEOUT};

/// Negotiated capture format, fixed once the stream is running.
#[derive(Debug, Clone, Copy)]
struct CaptureFormat {
    sample_rate: u32,
    channels: u16,
}

/// Captures system playback from a loopback device into memory and writes
/// it out as a 16-bit PCM WAV file when stopped.
pub struct LoopbackRecorder {
    samples: Arc<Mutex<Vec<f32>>>,
    format: Mutex<Option<CaptureFormat>>,
    wav_path: Mutex<Option<PathBuf>>,
    capture_thread: Mutex<Option<JoinHandle<()>>>,
    should_stop: Arc<AtomicBool>,
    is_active: AtomicBool,
}

impl LoopbackRecorder {
    pub fn new() -> Self {
        Self {
            samples: Arc::new(Mutex::new(Vec::new())),
            format: Mutex::new(None),
            wav_path: Mutex::new(None),
            capture_thread: Mutex::new(None),
            should_stop: Arc::new(AtomicBool::new(false)),
            is_active: AtomicBool::new(false),
        }
    }

    /// Start capturing system audio. The WAV file lands in the system temp
    /// directory as `<output_base>_audio.wav` when the session is stopped.
    #[instrument(name = "audio_capture_start", skip(self))]
    pub fn start(&self, output_base: &str) -> AudioResult<()> {
        if self.is_active.load(Ordering::SeqCst) {
            return Err(AudioError::AlreadyStarted);
        }

        let (device, device_name) =
            find_loopback_device().ok_or(AudioError::DeviceNotFound)?;
        let config = device.default_input_config()?;

        let channels = config.channels().min(MAX_CAPTURE_CHANNELS);
        if channels == 0 {
            return Err(AudioError::NoInputChannels(device_name));
        }
        let sample_rate = match config.sample_rate().0 {
            0 => FALLBACK_SAMPLE_RATE,
            rate => rate,
        };
        let sample_format = config.sample_format();

        info!(
            device = %device_name,
            sample_rate,
            channels,
            format = ?sample_format,
            "Starting system audio capture"
        );

        let wav_path = std::env::temp_dir().join(format!("{}_audio.wav", output_base));

        self.samples.lock().clear();
        self.should_stop.store(false, Ordering::SeqCst);

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let samples = Arc::clone(&self.samples);
        let should_stop = Arc::clone(&self.should_stop);
        let (ready_tx, ready_rx) = bounded::<AudioResult<()>>(1);

        let handle = thread::spawn(move || {
            capture_thread(
                device,
                stream_config,
                sample_format,
                samples,
                should_stop,
                ready_tx,
            );
        });

        match ready_rx.recv_timeout(START_TIMEOUT) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(e);
            }
            Err(_) => {
                self.should_stop.store(true, Ordering::SeqCst);
                let _ = handle.join();
                return Err(AudioError::StartTimeout);
            }
        }

        *self.format.lock() = Some(CaptureFormat {
            sample_rate,
            channels,
        });
        *self.wav_path.lock() = Some(wav_path);
        *self.capture_thread.lock() = Some(handle);
        self.is_active.store(true, Ordering::SeqCst);

        Ok(())
    }

    /// Stop capturing and flush the buffered samples to the WAV file.
    /// Returns the file path if anything was captured and written, `None`
    /// when the session was never started or produced no audio.
    #[instrument(name = "audio_capture_stop", skip(self))]
    pub fn stop(&self) -> Option<PathBuf> {
        if !self.is_active.load(Ordering::SeqCst) {
            return None;
        }

        info!("Stopping system audio capture");
        self.should_stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.lock().take() {
            let _ = handle.join();
        }
        self.is_active.store(false, Ordering::SeqCst);

        let format = self.format.lock().take()?;
        let path = self.wav_path.lock().take()?;
        let samples = std::mem::take(&mut *self.samples.lock());

        if samples.is_empty() {
            info!("No audio samples captured");
            return None;
        }

        if let Err(e) = write_wav(&path, &samples, format) {
            warn!("Failed to write audio file: {}", e);
            return None;
        }

        match std::fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => {
                info!(path = %path.display(), samples = samples.len(), "Audio capture saved");
                Some(path)
            }
            _ => {
                warn!("Audio file missing or empty after write");
                None
            }
        }
    }

    /// Whether a capture session is currently running.
    pub fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }
}

impl Default for LoopbackRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoopbackRecorder {
    fn drop(&mut self) {
        if self.is_active.load(Ordering::SeqCst) {
            self.should_stop.store(true, Ordering::SeqCst);
            if let Some(handle) = self.capture_thread.lock().take() {
                let _ = handle.join();
            }
        }
    }
}

/// Owns the cpal stream for the lifetime of the capture. Reports startup
/// success or failure through `ready_tx`, then idles until told to stop.
fn capture_thread(
    device: cpal::Device,
    config: cpal::StreamConfig,
    sample_format: SampleFormat,
    samples: Arc<Mutex<Vec<f32>>>,
    should_stop: Arc<AtomicBool>,
    ready_tx: Sender<AudioResult<()>>,
) {
    let err_fn = |err| warn!("Audio stream error: {}", err);

    let build_result = match sample_format {
        SampleFormat::I8 => device.build_input_stream(
            &config,
            {
                let samples = Arc::clone(&samples);
                move |data: &[i8], _: &_| push_samples(&samples, data)
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &config,
            {
                let samples = Arc::clone(&samples);
                move |data: &[i16], _: &_| push_samples(&samples, data)
            },
            err_fn,
            None,
        ),
        SampleFormat::I32 => device.build_input_stream(
            &config,
            {
                let samples = Arc::clone(&samples);
                move |data: &[i32], _: &_| push_samples(&samples, data)
            },
            err_fn,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            {
                let samples = Arc::clone(&samples);
                move |data: &[f32], _: &_| push_samples(&samples, data)
            },
            err_fn,
            None,
        ),
        other => {
            let _ = ready_tx.send(Err(AudioError::FormatNotSupported(format!("{:?}", other))));
            return;
        }
    };

    let stream = match build_result {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e.into()));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.into()));
        return;
    }

    let _ = ready_tx.send(Ok(()));
    debug!("Audio capture running");

    while !should_stop.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(50));
    }

    if let Err(e) = stream.pause() {
        warn!("Failed to pause audio stream: {}", e);
    }
    debug!("Audio capture thread exiting");
}

fn push_samples<T>(samples: &Mutex<Vec<f32>>, input: &[T])
where
    T: Sample,
    f32: FromSample<T>,
{
    let mut buffer = samples.lock();
    buffer.extend(input.iter().map(|s| f32::from_sample(*s)));
}

fn write_wav(path: &Path, samples: &[f32], format: CaptureFormat) -> AudioResult<()> {
    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample((sample * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_wav_format_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.wav");
        let format = CaptureFormat {
            sample_rate: 48000,
            channels: 2,
        };

        write_wav(&path, &[0.0, 0.5, -0.5, 1.0], format).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 48000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, -16383, 32767]);
    }

    #[test]
    fn test_write_wav_saturates_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loud.wav");
        let format = CaptureFormat {
            sample_rate: 44100,
            channels: 1,
        };

        write_wav(&path, &[1.5, -2.0], format).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_stop_without_start_is_none() {
        let recorder = LoopbackRecorder::new();
        assert!(!recorder.is_active());
        assert_eq!(recorder.stop(), None);
    }
}
