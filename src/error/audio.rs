// Audio capture error types

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log an audio error with structured context
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=Capture, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These cover the capture boundary: device acquisition, stream lifecycle
/// and the hand-off between the device callback and the capture worker.
///
/// Error code range: 1001-1008
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Capture is already running
    AlreadyRunning,

    /// Capture is not running
    NotRunning,

    /// Hardware error occurred
    HardwareError { details: String },

    /// Microphone permission denied
    PermissionDenied,

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },

    /// Block size must be non-zero
    InvalidBlockSize { size: usize },

    /// Audio stream disconnected or channel closed unexpectedly
    StreamFailure { reason: String },
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::AlreadyRunning => 1001,
            AudioError::NotRunning => 1002,
            AudioError::HardwareError { .. } => 1003,
            AudioError::PermissionDenied => 1004,
            AudioError::StreamOpenFailed { .. } => 1005,
            AudioError::LockPoisoned { .. } => 1006,
            AudioError::InvalidBlockSize { .. } => 1007,
            AudioError::StreamFailure { .. } => 1008,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::AlreadyRunning => {
                "Capture already running. Call stop() first.".to_string()
            }
            AudioError::NotRunning => "Capture not running. Call start() first.".to_string(),
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::PermissionDenied => "Microphone permission denied".to_string(),
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned for component: {}", component)
            }
            AudioError::InvalidBlockSize { size } => {
                format!("Block size must be greater than 0 (got {})", size)
            }
            AudioError::StreamFailure { reason } => {
                format!("Audio stream failure: {}", reason)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(AudioError::AlreadyRunning.code(), 1001);
        assert_eq!(AudioError::NotRunning.code(), 1002);
        assert_eq!(
            AudioError::HardwareError {
                details: "test".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(AudioError::PermissionDenied.code(), 1004);
        assert_eq!(
            AudioError::StreamOpenFailed {
                reason: "test".to_string()
            }
            .code(),
            1005
        );
        assert_eq!(
            AudioError::LockPoisoned {
                component: "test".to_string()
            }
            .code(),
            1006
        );
        assert_eq!(AudioError::InvalidBlockSize { size: 0 }.code(), 1007);
        assert_eq!(
            AudioError::StreamFailure {
                reason: "test".to_string()
            }
            .code(),
            1008
        );
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::AlreadyRunning;
        assert!(err.message().contains("already running"));

        let err = AudioError::InvalidBlockSize { size: 0 };
        assert!(err.to_string().contains("code 1007"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "test error");
        let audio_err: AudioError = io_err.into();

        match audio_err {
            AudioError::HardwareError { details } => {
                assert!(details.contains("test error"));
            }
            _ => panic!("Expected HardwareError variant"),
        }
    }
}
