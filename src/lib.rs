// Drum Buddy Core - onset detection and rhythm scoring for drum practice
//
// Live audio -> fixed blocks -> energy onset detector -> hit list
// Hit list + rhythm pattern -> greedy matcher -> scored session

pub mod analysis;
pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod pattern;
pub mod scoring;
pub mod telemetry;
pub mod testing;

pub use analysis::{DetectedHit, EnergyOnsetDetector, OnsetDetector};
pub use capture::{CaptureEvent, ConfigHandle, RecordingSession};
pub use config::{AppConfig, DetectorConfig};
pub use pattern::{Beat, DifficultyTier, RhythmPattern};
pub use scoring::{score, score_pattern, SessionResult, ToleranceWindow};

/// Install the fmt subscriber at INFO; see [`init_logging_with_level`]
pub fn init_logging() {
    init_logging_with_level(tracing::Level::INFO);
}

/// Install a `tracing-subscriber` fmt subscriber
///
/// `log` records are forwarded to the same subscriber. Safe to call more
/// than once; only the first call installs anything.
pub fn init_logging_with_level(level: tracing::Level) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging_with_level(tracing::Level::DEBUG);
        log::info!("[Test] log records reach the subscriber");
    }
}
