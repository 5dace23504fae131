//! Configuration management for detector, capture and scoring parameters
//!
//! Runtime configuration is loaded from a JSON file so the detector can be
//! tuned without recompiling. Missing or malformed files fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{AudioError, ConfigError};

/// Largest block the capture path accepts (~186ms at 44.1kHz)
pub const MAX_BLOCK_SIZE: usize = 8192;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Energy onset detector parameters
///
/// Immutable per use: the capture path only ever sees whole snapshots of
/// this struct, see [`crate::capture::ConfigHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum time between accepted onsets (ms)
    pub refractory_period_ms: f64,
    /// Onset decision threshold, in (0, 1]
    pub threshold: f32,
    /// Envelope values at or below this are ignored
    pub noise_floor: f32,
    /// Envelope attack time constant (samples)
    pub attack_samples: u32,
    /// Envelope release time constant (samples)
    pub release_samples: u32,
    /// Linear gain applied before analysis
    pub mic_gain_multiplier: f32,
    /// Sample rate in Hz, re-stamped from the input device
    pub sample_rate: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            refractory_period_ms: 100.0,
            threshold: 0.3,
            noise_floor: 0.01,
            attack_samples: 10,
            release_samples: 100,
            mic_gain_multiplier: 1.0,
            sample_rate: 44_100.0,
        }
    }
}

impl DetectorConfig {
    /// For quiet drums or a distant mic
    pub fn high_sensitivity() -> Self {
        Self {
            threshold: 0.15,
            noise_floor: 0.005,
            mic_gain_multiplier: 2.0,
            ..Self::default()
        }
    }

    /// For loud drums or a close mic
    pub fn low_sensitivity() -> Self {
        Self {
            threshold: 0.5,
            noise_floor: 0.02,
            mic_gain_multiplier: 0.7,
            ..Self::default()
        }
    }

    /// Refractory period converted to samples at the configured rate
    pub fn refractory_period_samples(&self) -> u64 {
        let samples = (self.refractory_period_ms / 1000.0 * self.sample_rate).round();
        if samples.is_finite() && samples > 0.0 {
            samples as u64
        } else {
            0
        }
    }

    /// Copy of this configuration stamped with a device sample rate
    pub fn with_sample_rate(self, sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..self
        }
    }

    /// Reject values that would make the detector meaningless
    ///
    /// Attack/release counts below 1 are not rejected; the envelope follower
    /// clamps them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold {
                threshold: self.threshold,
            });
        }
        if !(self.noise_floor >= 0.0 && self.noise_floor < self.threshold) {
            return Err(ConfigError::NoiseFloorOutOfRange {
                noise_floor: self.noise_floor,
                threshold: self.threshold,
            });
        }
        if !(self.mic_gain_multiplier > 0.0 && self.mic_gain_multiplier.is_finite()) {
            return Err(ConfigError::InvalidGain {
                gain: self.mic_gain_multiplier,
            });
        }
        if !(self.sample_rate > 0.0 && self.sample_rate.is_finite()) {
            return Err(ConfigError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        if !(self.refractory_period_ms >= 0.0 && self.refractory_period_ms.is_finite()) {
            return Err(ConfigError::InvalidRefractoryPeriod {
                ms: self.refractory_period_ms,
            });
        }
        Ok(())
    }
}

/// Capture pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Samples per analysis block (~11.6ms at 44.1kHz)
    pub block_size: usize,
    /// Number of pre-allocated blocks shared by device and worker
    pub block_pool_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            block_size: 512,
            block_pool_size: 32,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), AudioError> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(AudioError::InvalidBlockSize {
                size: self.block_size,
            });
        }
        Ok(())
    }

    /// Pool size actually allocated; a pool needs at least two blocks to circulate
    pub fn pool_size(&self) -> usize {
        self.block_pool_size.max(2)
    }
}

/// Scoring configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// User calibration override for the timing tolerance (0 = tier default)
    pub tolerance_override_ms: f64,
}

impl AppConfig {
    /// Load configuration from a JSON file
    ///
    /// Falls back to [`AppConfig::default`] if the file is missing, is not
    /// valid JSON, or holds a detector configuration that fails validation.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => match config.detector.validate() {
                    Ok(()) => {
                        log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                        config
                    }
                    Err(err) => {
                        crate::error::log_config_error(&err, "AppConfig::load_from_file");
                        Self::default()
                    }
                },
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/drum_buddy.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.detector.threshold, 0.3);
        assert_eq!(config.detector.attack_samples, 10);
        assert_eq!(config.capture.block_size, 512);
        assert_eq!(config.scoring.tolerance_override_ms, 0.0);
        assert!(config.detector.validate().is_ok());
    }

    #[test]
    fn test_refractory_period_samples_rounds() {
        let config = DetectorConfig::default();
        assert_eq!(config.refractory_period_samples(), 4410);

        let config = DetectorConfig {
            refractory_period_ms: 10.01,
            sample_rate: 1000.0,
            ..DetectorConfig::default()
        };
        assert_eq!(config.refractory_period_samples(), 10);

        let config = DetectorConfig {
            refractory_period_ms: 10.6,
            sample_rate: 1000.0,
            ..DetectorConfig::default()
        };
        assert_eq!(config.refractory_period_samples(), 11);
    }

    #[test]
    fn test_presets_validate() {
        assert!(DetectorConfig::high_sensitivity().validate().is_ok());
        assert!(DetectorConfig::low_sensitivity().validate().is_ok());
        assert_eq!(DetectorConfig::high_sensitivity().mic_gain_multiplier, 2.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_threshold = DetectorConfig {
            threshold: 0.0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            bad_threshold.validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));

        let floor_above = DetectorConfig {
            noise_floor: 0.4,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            floor_above.validate(),
            Err(ConfigError::NoiseFloorOutOfRange { .. })
        ));

        let no_gain = DetectorConfig {
            mic_gain_multiplier: 0.0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            no_gain.validate(),
            Err(ConfigError::InvalidGain { .. })
        ));

        let no_rate = DetectorConfig {
            sample_rate: 0.0,
            ..DetectorConfig::default()
        };
        assert!(matches!(
            no_rate.validate(),
            Err(ConfigError::InvalidSampleRate { .. })
        ));
    }

    #[test]
    fn test_capture_config_bounds() {
        assert!(CaptureConfig::default().validate().is_ok());

        let zero = CaptureConfig {
            block_size: 0,
            ..CaptureConfig::default()
        };
        assert_eq!(zero.validate(), Err(AudioError::InvalidBlockSize { size: 0 }));

        let tiny_pool = CaptureConfig {
            block_pool_size: 0,
            ..CaptureConfig::default()
        };
        assert_eq!(tiny_pool.pool_size(), 2);
    }

    #[test]
    fn test_json_roundtrip_with_partial_file() {
        let json = r#"{ "detector": { "threshold": 0.25 } }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.detector.threshold, 0.25);
        assert_eq!(parsed.detector.release_samples, 100);
        assert_eq!(parsed.capture.block_pool_size, 32);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/drum_buddy.json");
        assert_eq!(config.detector, DetectorConfig::default());
    }
}
