// Configuration validation errors

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=Config, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration values rejected at the boundary
///
/// Raised before a value reaches the detector or the scorer, never from
/// inside the per-block or per-hit loops.
///
/// Error code range: 3001-3007
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Threshold must lie in (0, 1]
    InvalidThreshold { threshold: f32 },

    /// Noise floor must be >= 0 and below the threshold
    NoiseFloorOutOfRange { noise_floor: f32, threshold: f32 },

    /// Mic gain must be > 0
    InvalidGain { gain: f32 },

    /// Sample rate must be > 0
    InvalidSampleRate { sample_rate: f64 },

    /// Refractory period must be finite and >= 0
    InvalidRefractoryPeriod { ms: f64 },

    /// Tolerance must exceed the perfect-timing window
    ToleranceTooSmall { tolerance_ms: f64, minimum_ms: f64 },

    /// BPM must be > 0
    InvalidBpm { bpm: u32 },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::InvalidThreshold { .. } => 3001,
            ConfigError::NoiseFloorOutOfRange { .. } => 3002,
            ConfigError::InvalidGain { .. } => 3003,
            ConfigError::InvalidSampleRate { .. } => 3004,
            ConfigError::InvalidRefractoryPeriod { .. } => 3005,
            ConfigError::ToleranceTooSmall { .. } => 3006,
            ConfigError::InvalidBpm { .. } => 3007,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::InvalidThreshold { threshold } => {
                format!("Threshold must be in (0, 1] (got {})", threshold)
            }
            ConfigError::NoiseFloorOutOfRange {
                noise_floor,
                threshold,
            } => format!(
                "Noise floor must be >= 0 and below threshold {} (got {})",
                threshold, noise_floor
            ),
            ConfigError::InvalidGain { gain } => {
                format!("Mic gain must be greater than 0 (got {})", gain)
            }
            ConfigError::InvalidSampleRate { sample_rate } => {
                format!("Sample rate must be greater than 0 (got {})", sample_rate)
            }
            ConfigError::InvalidRefractoryPeriod { ms } => {
                format!("Refractory period must be >= 0 ms (got {})", ms)
            }
            ConfigError::ToleranceTooSmall {
                tolerance_ms,
                minimum_ms,
            } => format!(
                "Tolerance must exceed {} ms (got {})",
                minimum_ms, tolerance_ms
            ),
            ConfigError::InvalidBpm { bpm } => {
                format!("BPM must be greater than 0 (got {})", bpm)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}
