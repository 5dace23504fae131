// EnvelopeFollower - asymmetric attack/release amplitude tracking
//
// Rectifies each sample and moves a single envelope value toward it, fast
// on the way up (attack) and slow on the way down (release):
//
//   coeff    = 1 - exp(-1 / max(1, time_constant_samples))
//   envelope = envelope + coeff * (|x| - envelope)

/// One-pole coefficient for a time constant given in samples
#[inline]
fn coefficient(time_constant_samples: u32) -> f32 {
    1.0 - (-1.0 / time_constant_samples.max(1) as f32).exp()
}

/// Tracks the amplitude envelope of a rectified signal
#[derive(Debug, Clone)]
pub struct EnvelopeFollower {
    envelope: f32,
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    pub fn new(attack_samples: u32, release_samples: u32) -> Self {
        Self {
            envelope: 0.0,
            attack_coeff: coefficient(attack_samples),
            release_coeff: coefficient(release_samples),
        }
    }

    /// Replace the time constants without touching the running envelope
    pub fn update_times(&mut self, attack_samples: u32, release_samples: u32) {
        self.attack_coeff = coefficient(attack_samples);
        self.release_coeff = coefficient(release_samples);
    }

    /// Feed one sample and return the updated envelope
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let rectified = sample.abs();
        let coeff = if rectified > self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope += coeff * (rectified - self.envelope);
        self.envelope
    }

    /// Feed a block and return the peak envelope seen within it
    ///
    /// Peak-hold rather than the final value, so a transient that rises and
    /// decays inside one block still registers.
    pub fn process_block(&mut self, samples: &[f32]) -> f32 {
        samples
            .iter()
            .fold(0.0_f32, |peak, &sample| peak.max(self.process(sample)))
    }

    pub fn envelope(&self) -> f32 {
        self.envelope
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new(10, 100)
    }
}
