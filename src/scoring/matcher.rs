//! Hit matching - pairs detected hits with expected beat times
//!
//! Greedy nearest-available assignment in ascending expected-time order:
//! each expected beat claims the closest still-unused detected hit within
//! the tolerance window. Earlier beats get first claim, so the result is
//! not a globally optimal assignment.

use serde::{Deserialize, Serialize};

use crate::analysis::DetectedHit;

/// How one expected beat was matched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitMatch {
    /// Expected beat time (seconds)
    pub expected_time: f64,
    /// Matched detection time (seconds), `None` if missed
    pub detected_time: Option<f64>,
    /// detected - expected in ms; positive = late, negative = early
    pub offset_ms: Option<f64>,
    pub was_matched: bool,
}

impl HitMatch {
    fn matched(expected_time: f64, detected_time: f64) -> Self {
        Self {
            expected_time,
            detected_time: Some(detected_time),
            offset_ms: Some((detected_time - expected_time) * 1000.0),
            was_matched: true,
        }
    }

    fn missed(expected_time: f64) -> Self {
        Self {
            expected_time,
            detected_time: None,
            offset_ms: None,
            was_matched: false,
        }
    }
}

fn sorted_times(times: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut times: Vec<f64> = times.collect();
    times.sort_by(f64::total_cmp);
    times
}

/// One [`HitMatch`] per expected time, in ascending expected-time order
pub fn match_hits(
    detected: &[DetectedHit],
    expected_times: &[f64],
    tolerance_ms: f64,
) -> Vec<HitMatch> {
    let tolerance_seconds = tolerance_ms / 1000.0;
    let detected = sorted_times(detected.iter().map(|hit| hit.timestamp));
    let expected = sorted_times(expected_times.iter().copied());

    let mut used = vec![false; detected.len()];

    expected
        .into_iter()
        .map(|expected_time| {
            let mut best: Option<(usize, f64)> = None;

            for (index, &detected_time) in detected.iter().enumerate() {
                if used[index] {
                    continue;
                }
                let abs_offset = (detected_time - expected_time).abs();
                if abs_offset > tolerance_seconds {
                    continue;
                }
                // Strict improvement keeps the earliest hit on ties
                if best.map_or(true, |(_, best_offset)| abs_offset < best_offset) {
                    best = Some((index, abs_offset));
                }
            }

            match best {
                Some((index, _)) => {
                    used[index] = true;
                    HitMatch::matched(expected_time, detected[index])
                }
                None => HitMatch::missed(expected_time),
            }
        })
        .collect()
}

/// Detected hits within tolerance of no expected time at all
///
/// Independent of [`match_hits`]: a hit near an expected beat that was
/// claimed by a closer hit is not extra.
pub fn count_extra_hits(
    detected: &[DetectedHit],
    expected_times: &[f64],
    tolerance_ms: f64,
) -> usize {
    let tolerance_seconds = tolerance_ms / 1000.0;
    detected
        .iter()
        .filter(|hit| {
            !expected_times
                .iter()
                .any(|expected| (hit.timestamp - expected).abs() <= tolerance_seconds)
        })
        .count()
}
