// Audio error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Single source of truth for the numeric codes reported by [`AudioError`].
///
/// Error code range: 1001-1008
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// No usable output device could be acquired
    pub const DEVICE_UNAVAILABLE: i32 = 1001;

    /// Failed to open the output stream
    pub const STREAM_OPEN_FAILED: i32 = 1002;

    /// Hardware error occurred while starting or resuming playback
    pub const HARDWARE_ERROR: i32 = 1003;

    /// The click queue towards the audio callback is full
    pub const QUEUE_FULL: i32 = 1004;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 1005;

    /// No tokio runtime is available to drive the scheduler tick
    pub const RUNTIME_UNAVAILABLE: i32 = 1006;

    /// Audio stream thread disconnected unexpectedly
    pub const STREAM_FAILURE: i32 = 1007;

    /// Offline render output could not be written
    pub const RENDER_FAILED: i32 = 1008;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=BeatClock, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover output device acquisition, stream management and
/// the scheduler runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// No output device found or the platform refused access
    DeviceUnavailable { reason: String },

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Hardware error occurred
    HardwareError { details: String },

    /// Pulse queue is full, the click was dropped
    QueueFull,

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// `start()` was called outside of a tokio runtime
    RuntimeUnavailable,

    /// Stream thread disconnected unexpectedly
    StreamFailure { reason: String },

    /// Writing the rendered click track failed
    RenderFailed { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::DeviceUnavailable { .. } => AudioErrorCodes::DEVICE_UNAVAILABLE,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::QueueFull => AudioErrorCodes::QUEUE_FULL,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
            AudioError::RuntimeUnavailable => AudioErrorCodes::RUNTIME_UNAVAILABLE,
            AudioError::StreamFailure { .. } => AudioErrorCodes::STREAM_FAILURE,
            AudioError::RenderFailed { .. } => AudioErrorCodes::RENDER_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::DeviceUnavailable { reason } => {
                format!("Audio output unavailable: {}", reason)
            }
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::QueueFull => "Click queue full, pulse dropped".to_string(),
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            AudioError::RuntimeUnavailable => {
                "No tokio runtime available. Start the metronome from within a runtime."
                    .to_string()
            }
            AudioError::StreamFailure { reason } => {
                format!("Audio stream failed: {}", reason)
            }
            AudioError::RenderFailed { reason } => {
                format!("Click track render failed: {}", reason)
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}

impl From<hound::Error> for AudioError {
    fn from(err: hound::Error) -> Self {
        AudioError::RenderFailed {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::DeviceUnavailable {
                reason: "test".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(
            AudioError::StreamOpenFailed {
                reason: "test".to_string()
            }
            .code(),
            1002
        );
        assert_eq!(
            AudioError::HardwareError {
                details: "test".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(AudioError::QueueFull.code(), 1004);
        assert_eq!(
            AudioError::LockPoisoned {
                component: "test".to_string()
            }
            .code(),
            1005
        );
        assert_eq!(AudioError::RuntimeUnavailable.code(), 1006);
        assert_eq!(
            AudioError::StreamFailure {
                reason: "test".to_string()
            }
            .code(),
            1007
        );
        assert_eq!(
            AudioError::RenderFailed {
                reason: "test".to_string()
            }
            .code(),
            1008
        );
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::DeviceUnavailable {
            reason: "no default output device".to_string(),
        };
        assert_eq!(
            err.message(),
            "Audio output unavailable: no default output device"
        );

        let err = AudioError::HardwareError {
            details: "test error".to_string(),
        };
        assert_eq!(err.message(), "Hardware error: test error");

        assert!(AudioError::RuntimeUnavailable.message().contains("tokio"));
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::QueueFull;
        let display = format!("{}", err);
        assert!(display.contains("AudioError"));
        assert!(display.contains(&err.code().to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("test io error");
        let audio_err: AudioError = io_err.into();
        match audio_err {
            AudioError::HardwareError { details } => {
                assert!(details.contains("test io error"));
            }
            _ => panic!("Expected HardwareError"),
        }
    }
}
