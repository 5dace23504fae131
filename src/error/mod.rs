// Error types for the drum practice core
//
// Typed error enums with stable numeric codes. The numeric core itself is
// total; these errors only surface at the boundaries (configuration
// validation and audio device access).

mod audio;
mod config;

pub use audio::{log_audio_error, AudioError};
pub use config::{log_config_error, ConfigError};

/// Error codes for structured error reporting
///
/// Gives every error type a stable numeric code plus a human-readable
/// message so callers outside Rust can branch on codes.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
