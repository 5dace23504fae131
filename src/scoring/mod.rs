// Scoring module - hit matching and session scoring
//
// Runs after recording stops, off the audio thread:
//   DetectedHit list + expected times -> match_hits -> score -> SessionResult

pub mod engine;
pub mod feedback;
pub mod matcher;
pub mod tolerance;

pub use engine::{score, score_pattern, star_rating, SessionResult};
pub use feedback::{FeedbackCategory, FeedbackDetail, TimingTendency};
pub use matcher::{count_extra_hits, match_hits, HitMatch};
pub use tolerance::{ToleranceWindow, PERFECT_TIMING_MS};
