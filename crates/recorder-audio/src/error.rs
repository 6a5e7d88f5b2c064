use thiserror::Error;

/// Errors that can occur during audio capture.
#[derive(Debug, Error)]
pub enum AudioError {
    /// No loopback-capable input device was found.
    #[error("No system loopback audio device found")]
    DeviceNotFound,

    /// The selected device reports no input channels.
    #[error("Audio device has no input channels: {0}")]
    NoInputChannels(String),

    /// The device produces samples in a format we cannot decode.
    #[error("Unsupported audio sample format: {0}")]
    FormatNotSupported(String),

    /// Capture was started while a session is already running.
    #[error("Audio capture already started")]
    AlreadyStarted,

    /// The capture stream did not come up within the start timeout.
    #[error("Timed out waiting for the audio stream to start")]
    StartTimeout,

    /// Failed to query the device's default stream configuration.
    #[error("Audio device configuration error: {0}")]
    DeviceConfig(#[from] cpal::DefaultStreamConfigError),

    /// Failed to build the input stream.
    #[error("Failed to build audio stream: {0}")]
    StreamBuild(#[from] cpal::BuildStreamError),

    /// Failed to start the input stream.
    #[error("Failed to start audio stream: {0}")]
    StreamPlay(#[from] cpal::PlayStreamError),

    /// Failed to encode or write the WAV file.
    #[error("WAV write error: {0}")]
    Wav(#[from] hound::Error),

    /// Filesystem error while handling the capture output.
    #[error("Audio I/O error: {0}")]
    Io(#[from] std::io::Error),
}
