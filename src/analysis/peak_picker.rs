// PeakPicker - threshold/refractory state machine over envelope values
//
// Called once per block with the block's peak-held envelope. An onset is
// accepted when the picker is armed, the value clears both the noise floor
// and the threshold, and the envelope is rising (more than 10% above the
// previous block, or emerging from below the noise floor). Accepting
// disarms the picker until `refractory_period_samples` have elapsed.
//
// Every call commits `previous_value = current` and advances the sample
// count after the decision, whatever the outcome.

/// Relative increase over the previous block that counts as rising
const RISE_FACTOR: f32 = 1.1;

/// Stateful onset decision over a stream of envelope values
#[derive(Debug, Clone)]
pub struct PeakPicker {
    threshold: f32,
    noise_floor: f32,
    refractory_period_samples: u64,
    previous_value: f32,
    is_armed: bool,
    samples_since_last_accepted: u64,
}

impl PeakPicker {
    pub fn new(threshold: f32, noise_floor: f32, refractory_period_samples: u64) -> Self {
        Self {
            threshold,
            noise_floor,
            refractory_period_samples,
            previous_value: 0.0,
            is_armed: true,
            samples_since_last_accepted: 0,
        }
    }

    /// Decide whether `current_value` starts a new onset
    pub fn is_peak(&mut self, current_value: f32, sample_count: usize) -> bool {
        let previous_value = self.previous_value;
        let accepted = self.decide(current_value, previous_value);

        self.previous_value = current_value;
        self.samples_since_last_accepted = self
            .samples_since_last_accepted
            .saturating_add(sample_count as u64);

        accepted
    }

    fn decide(&mut self, current_value: f32, previous_value: f32) -> bool {
        if !self.is_armed && self.samples_since_last_accepted >= self.refractory_period_samples {
            self.is_armed = true;
        }

        if !self.is_armed {
            return false;
        }

        if current_value <= self.noise_floor || current_value <= self.threshold {
            return false;
        }

        let is_rising =
            current_value > previous_value * RISE_FACTOR || previous_value < self.noise_floor;

        if is_rising {
            self.is_armed = false;
            self.samples_since_last_accepted = 0;
            return true;
        }

        false
    }

    /// Replace the decision parameters, keeping trailing state
    pub fn update_configuration(
        &mut self,
        threshold: f32,
        noise_floor: f32,
        refractory_period_samples: u64,
    ) {
        self.threshold = threshold;
        self.noise_floor = noise_floor;
        self.refractory_period_samples = refractory_period_samples;
    }

    pub fn reset(&mut self) {
        self.previous_value = 0.0;
        self.is_armed = true;
        self.samples_since_last_accepted = 0;
    }

    pub fn is_armed(&self) -> bool {
        self.is_armed
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: usize = 512;

    fn picker() -> PeakPicker {
        PeakPicker::new(0.3, 0.01, 4410)
    }

    #[test]
    fn test_accepts_rising_value_above_threshold() {
        let mut picker = picker();
        assert!(!picker.is_peak(0.0, BLOCK));
        assert!(picker.is_peak(0.6, BLOCK));
        assert!(!picker.is_armed());
    }

    #[test]
    fn test_rejects_below_noise_floor_and_threshold() {
        let mut picker = picker();
        assert!(!picker.is_peak(0.005, BLOCK));
        assert!(!picker.is_peak(0.2, BLOCK));
        assert!(!picker.is_peak(0.3, BLOCK));
        assert!(picker.is_armed());
    }

    #[test]
    fn test_rejects_value_that_is_not_rising() {
        let mut picker = picker();
        // 0.29 is below threshold; 0.31 is above it but less than a 10% rise
        assert!(!picker.is_peak(0.29, BLOCK));
        assert!(!picker.is_peak(0.31, BLOCK));
        assert!(picker.is_armed());
    }

    #[test]
    fn test_emerging_from_noise_floor_counts_as_rising() {
        // Previous value below the floor qualifies even without a 10% rise
        let mut picker = PeakPicker::new(0.32, 0.3, 0);
        assert!(!picker.is_peak(0.299, BLOCK));
        assert!(picker.is_peak(0.325, BLOCK));

        // Same step from just above the floor is rejected
        let mut picker = PeakPicker::new(0.32, 0.3, 0);
        assert!(!picker.is_peak(0.301, BLOCK));
        assert!(!picker.is_peak(0.325, BLOCK));
    }

    #[test]
    fn test_refractory_period_blocks_retrigger() {
        let mut picker = PeakPicker::new(0.3, 0.01, 2048);
        assert!(picker.is_peak(0.8, BLOCK));
        assert!(!picker.is_peak(0.05, BLOCK));
        // 1024 samples elapsed, still refractory
        assert!(!picker.is_peak(0.9, BLOCK));
        assert!(!picker.is_peak(0.05, BLOCK));
        // 2048 elapsed: re-armed and rising
        assert!(picker.is_peak(0.9, BLOCK));
    }

    #[test]
    fn test_refractory_uses_count_before_current_block() {
        let mut picker = PeakPicker::new(0.3, 0.01, BLOCK as u64);
        assert!(picker.is_peak(0.8, BLOCK));
        // Count is 512 from the accepting call; re-armed on this call
        assert!(!picker.is_peak(0.0, BLOCK));
        assert!(picker.is_peak(0.8, BLOCK));
    }

    #[test]
    fn test_never_fires_twice_within_refractory_window() {
        let refractory = 4410_u64;
        let mut picker = PeakPicker::new(0.3, 0.01, refractory);
        let mut elapsed = 0_u64;
        let mut last_accept: Option<u64> = None;

        for i in 0..400 {
            let value = if i % 3 == 0 { 0.9 } else { 0.02 };
            if picker.is_peak(value, BLOCK) {
                if let Some(prev) = last_accept {
                    assert!(elapsed - prev >= refractory);
                }
                last_accept = Some(elapsed);
            }
            elapsed += BLOCK as u64;
        }
        assert!(last_accept.is_some());
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let input: Vec<f32> = (0..200)
            .map(|i| ((i as f32 * 0.37).sin().abs() * 0.9))
            .collect();

        let run = |values: &[f32]| {
            let mut picker = PeakPicker::new(0.3, 0.01, 1024);
            values
                .iter()
                .map(|&v| picker.is_peak(v, BLOCK))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(&input), run(&input));
    }

    #[test]
    fn test_update_configuration_keeps_state() {
        let mut picker = picker();
        assert!(picker.is_peak(0.8, BLOCK));
        picker.update_configuration(0.1, 0.001, 0);
        assert_eq!(picker.threshold(), 0.1);
        assert!(!picker.is_armed());
        // Next call re-arms because refractory is now 0
        assert!(!picker.is_peak(0.5, BLOCK));
        assert!(picker.is_armed());
    }

    #[test]
    fn test_reset() {
        let mut picker = picker();
        assert!(picker.is_peak(0.8, BLOCK));
        picker.reset();
        assert!(picker.is_armed());
        assert!(picker.is_peak(0.8, BLOCK));
    }
}
