//! Scoring engine - turns matched hits into a session result
//!
//! overall = round(0.7 * hit_accuracy + 0.3 * timing)
//!
//! - hit_accuracy: matched/expected * 100 minus 5 per extra hit (max 25)
//! - timing: mean per-hit timing quality * 100 over matched hits
//!
//! Pure function of its inputs; runs off the audio thread after recording.

use serde::{Deserialize, Serialize};

use crate::analysis::DetectedHit;
use crate::error::ConfigError;
use crate::pattern::RhythmPattern;

use super::feedback::{FeedbackCategory, FeedbackDetail, FeedbackInput};
use super::matcher::{count_extra_hits, match_hits, HitMatch};
use super::tolerance::ToleranceWindow;

const HIT_ACCURACY_WEIGHT: f64 = 0.7;
const TIMING_WEIGHT: f64 = 0.3;
const EXTRA_HIT_PENALTY: f64 = 5.0;
const MAX_EXTRA_PENALTY: f64 = 25.0;

/// Scored outcome of one practice attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// 0-100
    pub overall_score: u8,
    /// 0-3
    pub star_rating: u8,
    pub expected_hits: usize,
    pub matched_hits: usize,
    pub extra_hits: usize,
    pub missed_hits: usize,
    /// Mean signed offset of matched hits; positive = late
    pub average_offset_ms: f64,
    pub hit_accuracy_score: f64,
    pub timing_score: f64,
    pub hit_matches: Vec<HitMatch>,
    pub feedback: FeedbackCategory,
    pub feedback_detail: Option<FeedbackDetail>,
    pub feedback_message: String,
}

impl SessionResult {
    pub fn match_percentage(&self) -> f64 {
        if self.expected_hits == 0 {
            return 0.0;
        }
        self.matched_hits as f64 / self.expected_hits as f64 * 100.0
    }

    pub fn is_perfect(&self) -> bool {
        self.expected_hits > 0 && self.matched_hits == self.expected_hits && self.extra_hits == 0
    }
}

/// Matched share of expected beats, penalized for extra hits
pub fn hit_accuracy_score(matched: usize, expected: usize, extra: usize) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    let base = matched as f64 / expected as f64 * 100.0;
    let penalty = (extra as f64 * EXTRA_HIT_PENALTY).min(MAX_EXTRA_PENALTY);
    (base - penalty).max(0.0)
}

/// Mean timing quality of matched offsets, scaled to 0-100
pub fn timing_score(offsets_ms: &[f64], tolerance: ToleranceWindow) -> f64 {
    if offsets_ms.is_empty() {
        return 0.0;
    }
    let total: f64 = offsets_ms
        .iter()
        .map(|&offset| tolerance.timing_quality(offset))
        .sum();
    total / offsets_ms.len() as f64 * 100.0
}

/// 3 for 85+, 2 for 60+, 1 for 30+, else 0
pub fn star_rating(score: u8) -> u8 {
    match score {
        85..=u8::MAX => 3,
        60..=84 => 2,
        30..=59 => 1,
        _ => 0,
    }
}

/// Score detected hits against expected beat times
pub fn score(
    detected: &[DetectedHit],
    expected_times: &[f64],
    tolerance: ToleranceWindow,
) -> SessionResult {
    let hit_matches = match_hits(detected, expected_times, tolerance.ms());

    let matched = hit_matches.iter().filter(|m| m.was_matched).count();
    let missed = hit_matches.len() - matched;
    let extra = count_extra_hits(detected, expected_times, tolerance.ms());
    let expected = expected_times.len();

    let offsets: Vec<f64> = hit_matches.iter().filter_map(|m| m.offset_ms).collect();
    let average_offset_ms = if offsets.is_empty() {
        0.0
    } else {
        offsets.iter().sum::<f64>() / offsets.len() as f64
    };

    let hit_accuracy = hit_accuracy_score(matched, expected, extra);
    let timing = timing_score(&offsets, tolerance);
    let overall = (hit_accuracy * HIT_ACCURACY_WEIGHT + timing * TIMING_WEIGHT)
        .round()
        .clamp(0.0, 100.0) as u8;
    let stars = star_rating(overall);

    let feedback_input = FeedbackInput {
        stars,
        expected,
        matched,
        missed,
        extra,
        average_offset_ms,
    };
    let feedback = FeedbackCategory::select(&feedback_input);

    SessionResult {
        overall_score: overall,
        star_rating: stars,
        expected_hits: expected,
        matched_hits: matched,
        extra_hits: extra,
        missed_hits: missed,
        average_offset_ms,
        hit_accuracy_score: hit_accuracy,
        timing_score: timing,
        hit_matches,
        feedback,
        feedback_detail: FeedbackDetail::select(&feedback_input),
        feedback_message: feedback.message(),
    }
}

/// Score against a pattern played at `bpm`
pub fn score_pattern(
    detected: &[DetectedHit],
    pattern: &RhythmPattern,
    bpm: u32,
    tolerance: ToleranceWindow,
) -> Result<SessionResult, ConfigError> {
    let expected_times = pattern.hit_times(bpm)?;
    Ok(score(detected, &expected_times, tolerance))
}
