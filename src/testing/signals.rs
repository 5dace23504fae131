//! Deterministic synthetic drum recordings
//!
//! Each hit is a decaying low sine burst, the noise bed is seeded uniform
//! noise, so the same [`HitTrain`] always renders the same samples.

use std::f32::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const DEFAULT_SEED: u64 = 0x5A5A_FFF0;

/// Description of a synthetic recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitTrain {
    /// Onset times in seconds
    pub hit_times: Vec<f64>,
    pub sample_rate: u32,
    /// Total length; 0 = last hit plus half a second
    #[serde(default)]
    pub duration_secs: f64,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f32,
    /// Exponential decay time constant of each hit
    #[serde(default = "default_decay_secs")]
    pub decay_secs: f32,
    /// Peak amplitude of the background noise
    #[serde(default)]
    pub noise_amplitude: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_amplitude() -> f32 {
    0.8
}

fn default_frequency_hz() -> f32 {
    180.0
}

fn default_decay_secs() -> f32 {
    0.03
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl HitTrain {
    pub fn new(hit_times: &[f64], sample_rate: u32) -> Self {
        Self {
            hit_times: hit_times.to_vec(),
            sample_rate,
            duration_secs: 0.0,
            amplitude: default_amplitude(),
            frequency_hz: default_frequency_hz(),
            decay_secs: default_decay_secs(),
            noise_amplitude: 0.0,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_noise(mut self, noise_amplitude: f32, seed: u64) -> Self {
        self.noise_amplitude = noise_amplitude;
        self.seed = seed;
        self
    }

    pub fn with_duration(mut self, duration_secs: f64) -> Self {
        self.duration_secs = duration_secs;
        self
    }

    fn total_frames(&self) -> usize {
        let duration = if self.duration_secs > 0.0 {
            self.duration_secs
        } else {
            self.hit_times.iter().copied().fold(0.0_f64, f64::max) + 0.5
        };
        (duration * self.sample_rate as f64).round() as usize
    }

    /// Render mono samples
    pub fn render(&self) -> Vec<f32> {
        let frames = self.total_frames();
        let rate = self.sample_rate as f32;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut samples: Vec<f32> = (0..frames)
            .map(|_| {
                if self.noise_amplitude > 0.0 {
                    rng.gen_range(-self.noise_amplitude..self.noise_amplitude)
                } else {
                    0.0
                }
            })
            .collect();

        // Hits stop contributing after ~7 time constants
        let hit_frames = (self.decay_secs.max(0.001) * 7.0 * rate) as usize;
        for &time in &self.hit_times {
            let start = (time * self.sample_rate as f64).round();
            if !(start >= 0.0) {
                continue;
            }
            let start = start as usize;
            for offset in 0..hit_frames {
                let Some(sample) = samples.get_mut(start + offset) else {
                    break;
                };
                let t = offset as f32 / rate;
                let decay = (-t / self.decay_secs.max(0.001)).exp();
                *sample += self.amplitude * decay * (2.0 * PI * self.frequency_hz * t).sin();
            }
        }

        samples
    }
}
