//! Timing tolerance and per-hit timing quality

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pattern::DifficultyTier;

/// Offsets below this score full timing quality
pub const PERFECT_TIMING_MS: f64 = 10.0;

/// A validated ± matching window in milliseconds
///
/// Always wider than [`PERFECT_TIMING_MS`], so the linear timing falloff
/// has a positive range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ToleranceWindow(f64);

impl ToleranceWindow {
    pub fn new(tolerance_ms: f64) -> Result<Self, ConfigError> {
        if tolerance_ms.is_finite() && tolerance_ms > PERFECT_TIMING_MS {
            Ok(Self(tolerance_ms))
        } else {
            Err(ConfigError::ToleranceTooSmall {
                tolerance_ms,
                minimum_ms: PERFECT_TIMING_MS,
            })
        }
    }

    /// Tier default, unless a positive calibration override is set
    pub fn resolve(tier: DifficultyTier, override_ms: f64) -> Result<Self, ConfigError> {
        if override_ms > 0.0 {
            Self::new(override_ms)
        } else {
            Self::new(tier.timing_tolerance_ms())
        }
    }

    pub fn for_tier(tier: DifficultyTier) -> Self {
        Self(tier.timing_tolerance_ms())
    }

    pub fn ms(&self) -> f64 {
        self.0
    }

    /// Timing quality in [0, 1] for a signed offset
    ///
    /// 1.0 under 10ms, then linear down to 0.0 at the tolerance edge.
    pub fn timing_quality(&self, offset_ms: f64) -> f64 {
        let abs_offset = offset_ms.abs();
        if abs_offset < PERFECT_TIMING_MS {
            return 1.0;
        }
        let range = self.0 - PERFECT_TIMING_MS;
        let position = abs_offset - PERFECT_TIMING_MS;
        (1.0 - position / range).max(0.0)
    }
}

impl TryFrom<f64> for ToleranceWindow {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToleranceWindow> for f64 {
    fn from(window: ToleranceWindow) -> Self {
        window.0
    }
}
