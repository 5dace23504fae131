// OnsetDetector - energy-based onset detection
//
// Per block:
// 1. Apply mic gain
// 2. RMS of the gained block -> current_level (display only)
// 3. Envelope follower over the gained block -> peak envelope
// 4. Peak picker on that value -> DetectedHit or nothing
//
// The hot path reuses a scratch buffer sized on first use, so steady-state
// processing of fixed-size blocks does not allocate.

use crate::config::DetectorConfig;

use super::envelope::EnvelopeFollower;
use super::peak_picker::PeakPicker;
use super::DetectedHit;

/// Strategy interface for onset detection
///
/// Implementations turn blocks of mono samples into at most one detected
/// hit per block. A swap-in detector (e.g. a learned model) only needs to
/// implement this trait.
pub trait OnsetDetector: Send {
    /// Active configuration snapshot
    fn configuration(&self) -> &DetectorConfig;

    /// Apply a new configuration from the next block onward
    fn set_configuration(&mut self, config: DetectorConfig);

    /// Analyze one block captured at `timestamp` seconds after recording start
    fn detect_onset(&mut self, block: &[f32], timestamp: f64) -> Option<DetectedHit>;

    /// Clear all running state (start of a new recording)
    fn reset(&mut self);

    /// RMS level of the last processed block, for visualization
    fn current_level(&self) -> f32;
}

/// Root mean square of a block, 0 for an empty block
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Envelope-follower + peak-picker onset detector
pub struct EnergyOnsetDetector {
    config: DetectorConfig,
    envelope_follower: EnvelopeFollower,
    peak_picker: PeakPicker,
    current_level: f32,
    scratch: Vec<f32>,
}

impl EnergyOnsetDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            envelope_follower: EnvelopeFollower::new(
                config.attack_samples,
                config.release_samples,
            ),
            peak_picker: PeakPicker::new(
                config.threshold,
                config.noise_floor,
                config.refractory_period_samples(),
            ),
            config,
            current_level: 0.0,
            scratch: Vec::new(),
        }
    }

    /// Pre-size the scratch buffer so the first block does not allocate
    pub fn with_block_capacity(mut self, block_size: usize) -> Self {
        self.scratch.reserve(block_size);
        self
    }

    fn apply_configuration(&mut self) {
        self.envelope_follower
            .update_times(self.config.attack_samples, self.config.release_samples);
        self.peak_picker.update_configuration(
            self.config.threshold,
            self.config.noise_floor,
            self.config.refractory_period_samples(),
        );
    }
}

impl Default for EnergyOnsetDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl OnsetDetector for EnergyOnsetDetector {
    fn configuration(&self) -> &DetectorConfig {
        &self.config
    }

    fn set_configuration(&mut self, config: DetectorConfig) {
        self.config = config;
        self.apply_configuration();
    }

    fn detect_onset(&mut self, block: &[f32], timestamp: f64) -> Option<DetectedHit> {
        let gain = self.config.mic_gain_multiplier;
        self.scratch.clear();
        self.scratch.extend(block.iter().map(|sample| sample * gain));

        self.current_level = rms(&self.scratch);

        let envelope = self.envelope_follower.process_block(&self.scratch);

        if self.peak_picker.is_peak(envelope, self.scratch.len()) {
            Some(DetectedHit::new(timestamp, envelope, self.config.threshold))
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.envelope_follower.reset();
        self.peak_picker.reset();
        self.current_level = 0.0;
    }

    fn current_level(&self) -> f32 {
        self.current_level
    }
}
