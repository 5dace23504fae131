//! Metric event types published on the telemetry stream.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    Onset {
        timestamp: f64,
        amplitude: f32,
        confidence: f32,
    },
    SessionScored {
        score: u8,
        stars: u8,
        matched: usize,
        expected: usize,
    },
    /// Blocks lost to pool exhaustion since the last report
    BlocksDropped {
        count: u64,
    },
    /// Rolling statistics over recent matched-hit offsets
    TimingOffset {
        avg_abs_ms: f64,
        max_abs_ms: f64,
        sample_count: usize,
    },
}
