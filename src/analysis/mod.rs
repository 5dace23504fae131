// Analysis module - real-time onset detection
//
// Pipeline per audio block:
//   gain -> EnvelopeFollower (peak-held) -> PeakPicker -> DetectedHit
//
// Everything here is pure CPU work over a caller-owned block; no I/O, no
// locks, and no allocation once the detector's scratch buffer is sized.

use std::cmp::Ordering;

pub mod envelope;
pub mod onset;
pub mod peak_picker;

pub use envelope::EnvelopeFollower;
pub use onset::{EnergyOnsetDetector, OnsetDetector};
pub use peak_picker::PeakPicker;

/// A drum hit detected from microphone input
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectedHit {
    /// Seconds since recording start
    pub timestamp: f64,
    /// Envelope value that triggered the detection
    pub amplitude: f32,
    /// amplitude / threshold, clamped to [0, 1]
    pub confidence: f32,
}

impl DetectedHit {
    /// Build a hit, deriving confidence from the detection threshold
    pub fn new(timestamp: f64, amplitude: f32, threshold: f32) -> Self {
        let confidence = if threshold > 0.0 {
            (amplitude / threshold).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            timestamp,
            amplitude,
            confidence,
        }
    }

    /// Hit at `timestamp` with full confidence, for externally supplied times
    pub fn at(timestamp: f64) -> Self {
        Self {
            timestamp,
            amplitude: 1.0,
            confidence: 1.0,
        }
    }

    /// Order by timestamp (NaN-safe)
    pub fn cmp_by_time(&self, other: &Self) -> Ordering {
        self.timestamp.total_cmp(&other.timestamp)
    }
}
