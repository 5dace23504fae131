//! Rhythm patterns and difficulty tiers
//!
//! Patterns are consumed, not generated, by the core: scoring only needs
//! the expected hit times at a tempo and the tier's timing tolerance.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Difficulty tiers, easiest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyTier {
    Beginner,
    EasyPeasy,
    GettingGood,
    RockStar,
    DrumHero,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 5] = [
        DifficultyTier::Beginner,
        DifficultyTier::EasyPeasy,
        DifficultyTier::GettingGood,
        DifficultyTier::RockStar,
        DifficultyTier::DrumHero,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            DifficultyTier::Beginner => "Beginner",
            DifficultyTier::EasyPeasy => "Easy Peasy",
            DifficultyTier::GettingGood => "Getting Good",
            DifficultyTier::RockStar => "Rock Star",
            DifficultyTier::DrumHero => "Drum Hero",
        }
    }

    /// ± window around each expected beat
    pub fn timing_tolerance_ms(&self) -> f64 {
        match self {
            DifficultyTier::Beginner => 150.0,
            DifficultyTier::EasyPeasy => 130.0,
            DifficultyTier::GettingGood => 110.0,
            DifficultyTier::RockStar => 90.0,
            DifficultyTier::DrumHero => 70.0,
        }
    }

    /// Inclusive BPM range for patterns at this tier
    pub fn bpm_range(&self) -> (u32, u32) {
        match self {
            DifficultyTier::Beginner => (50, 60),
            DifficultyTier::EasyPeasy => (55, 65),
            DifficultyTier::GettingGood => (60, 75),
            DifficultyTier::RockStar => (65, 80),
            DifficultyTier::DrumHero => (70, 90),
        }
    }

    pub fn suggested_bpm(&self) -> u32 {
        let (low, high) = self.bpm_range();
        (low + high) / 2
    }
}

/// A single position in a pattern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    /// 0 = first beat, 0.5 = the eighth after it, ...
    pub position_in_beats: f64,
    #[serde(default)]
    pub is_rest: bool,
    /// 1.0 normal, > 1 accented, < 1 ghost note
    #[serde(default = "default_accent")]
    pub accent: f64,
}

fn default_accent() -> f64 {
    1.0
}

impl Beat {
    pub fn hit(position_in_beats: f64) -> Self {
        Self {
            position_in_beats,
            is_rest: false,
            accent: 1.0,
        }
    }

    pub fn rest(position_in_beats: f64) -> Self {
        Self {
            is_rest: true,
            ..Self::hit(position_in_beats)
        }
    }

    pub fn time_in_seconds(&self, bpm: u32) -> f64 {
        self.position_in_beats * 60.0 / bpm as f64
    }
}

/// An ordered sequence of beats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmPattern {
    pub name: String,
    pub difficulty: DifficultyTier,
    beats: Vec<Beat>,
    #[serde(default)]
    suggested_bpm: Option<u32>,
}

impl RhythmPattern {
    /// Build a pattern; beats are sorted by position
    pub fn new(name: impl Into<String>, difficulty: DifficultyTier, mut beats: Vec<Beat>) -> Self {
        beats.sort_by(|a, b| a.position_in_beats.total_cmp(&b.position_in_beats));
        Self {
            name: name.into(),
            difficulty,
            beats,
            suggested_bpm: None,
        }
    }

    pub fn with_suggested_bpm(mut self, bpm: u32) -> Self {
        self.suggested_bpm = Some(bpm);
        self
    }

    /// Parse a pattern from JSON, re-sorting beats
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let parsed: RhythmPattern = serde_json::from_str(json)?;
        let RhythmPattern {
            name,
            difficulty,
            beats,
            suggested_bpm,
        } = parsed;
        let mut pattern = Self::new(name, difficulty, beats);
        pattern.suggested_bpm = suggested_bpm;
        Ok(pattern)
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn suggested_bpm(&self) -> u32 {
        self.suggested_bpm
            .unwrap_or_else(|| self.difficulty.suggested_bpm())
    }

    /// Beats that are played (not rests)
    pub fn hits(&self) -> impl Iterator<Item = &Beat> {
        self.beats.iter().filter(|beat| !beat.is_rest)
    }

    /// Expected hit times in seconds at `bpm`, ascending
    pub fn hit_times(&self, bpm: u32) -> Result<Vec<f64>, ConfigError> {
        if bpm == 0 {
            return Err(ConfigError::InvalidBpm { bpm });
        }
        Ok(self.hits().map(|beat| beat.time_in_seconds(bpm)).collect())
    }

    /// Last beat plus one beat of tail
    pub fn duration_in_beats(&self) -> f64 {
        self.beats
            .last()
            .map(|beat| beat.position_in_beats + 1.0)
            .unwrap_or(0.0)
    }

    pub fn duration_in_seconds(&self, bpm: u32) -> Result<f64, ConfigError> {
        if bpm == 0 {
            return Err(ConfigError::InvalidBpm { bpm });
        }
        Ok(self.duration_in_beats() * 60.0 / bpm as f64)
    }
}
