//! Feedback selection for scored sessions
//!
//! Which kind of message applies is decided here; the phrasing returned by
//! [`FeedbackCategory::message`] is a plain default that presentation
//! layers are free to replace.

use serde::{Deserialize, Serialize};

/// Average offset beyond which timing is reported as early/late
const TIMING_TENDENCY_MS: f64 = 50.0;

/// Headline feedback, chosen by star tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackCategory {
    /// Every beat matched, nothing extra
    Perfect,
    Great,
    MissedBeats { missed: usize },
    ExtraHits,
    AlmostThere,
    /// More than half the beats were missed
    ListenAgain,
    GettingThere,
    TryAgain,
}

/// Counts the selection is made from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackInput {
    pub stars: u8,
    pub expected: usize,
    pub matched: usize,
    pub missed: usize,
    pub extra: usize,
    pub average_offset_ms: f64,
}

impl FeedbackInput {
    pub fn is_perfect(&self) -> bool {
        self.expected > 0 && self.matched == self.expected && self.extra == 0
    }
}

impl FeedbackCategory {
    pub fn select(input: &FeedbackInput) -> Self {
        if input.is_perfect() {
            return FeedbackCategory::Perfect;
        }

        match input.stars {
            3 => FeedbackCategory::Great,
            2 if input.missed > 0 => FeedbackCategory::MissedBeats {
                missed: input.missed,
            },
            2 if input.extra > 0 => FeedbackCategory::ExtraHits,
            2 => FeedbackCategory::AlmostThere,
            1 if input.missed > input.expected / 2 => FeedbackCategory::ListenAgain,
            1 => FeedbackCategory::GettingThere,
            _ => FeedbackCategory::TryAgain,
        }
    }

    pub fn message(&self) -> String {
        match self {
            FeedbackCategory::Perfect => "Perfect! You nailed every beat!".to_string(),
            FeedbackCategory::Great => "Great job! You've got the rhythm!".to_string(),
            FeedbackCategory::MissedBeats { missed } => format!(
                "Nice try! You missed {} beat{}. Keep practicing!",
                missed,
                if *missed == 1 { "" } else { "s" }
            ),
            FeedbackCategory::ExtraHits => {
                "Good effort! Try to match the pattern exactly.".to_string()
            }
            FeedbackCategory::AlmostThere => {
                "Good job! A little more practice and you'll get 3 stars!".to_string()
            }
            FeedbackCategory::ListenAgain => {
                "Keep trying! Listen to the pattern again.".to_string()
            }
            FeedbackCategory::GettingThere => {
                "You're getting there! Try listening carefully to the rhythm.".to_string()
            }
            FeedbackCategory::TryAgain => "Don't give up! Let's try again!".to_string(),
        }
    }
}

/// Average timing direction of matched hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingTendency {
    Early,
    OnTime,
    Late,
}

impl TimingTendency {
    pub fn from_average_offset(average_offset_ms: f64) -> Self {
        if average_offset_ms > TIMING_TENDENCY_MS {
            TimingTendency::Late
        } else if average_offset_ms < -TIMING_TENDENCY_MS {
            TimingTendency::Early
        } else {
            TimingTendency::OnTime
        }
    }
}

/// Follow-up pointing at whatever dominated a non-perfect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackDetail {
    MissedBeats { count: usize },
    ExtraHits { count: usize },
    Timing { tendency: TimingTendency },
}

impl FeedbackDetail {
    pub fn select(input: &FeedbackInput) -> Option<Self> {
        if input.is_perfect() {
            None
        } else if input.missed > 0 && input.missed > input.extra {
            Some(FeedbackDetail::MissedBeats {
                count: input.missed,
            })
        } else if input.extra > 0 && input.extra > input.missed {
            Some(FeedbackDetail::ExtraHits { count: input.extra })
        } else if input.matched > 0 {
            Some(FeedbackDetail::Timing {
                tendency: TimingTendency::from_average_offset(input.average_offset_ms),
            })
        } else {
            None
        }
    }

    pub fn message(&self) -> String {
        match self {
            FeedbackDetail::MissedBeats { count: 1 } => "You just missed one beat!".to_string(),
            FeedbackDetail::MissedBeats { count } => {
                format!("You missed {} beats. Listen carefully!", count)
            }
            FeedbackDetail::ExtraHits { count: 1 } => "You added an extra hit!".to_string(),
            FeedbackDetail::ExtraHits { count } => {
                format!("You added {} extra hits. Match the pattern exactly!", count)
            }
            FeedbackDetail::Timing {
                tendency: TimingTendency::Late,
            } => "Try hitting a tiny bit earlier!".to_string(),
            FeedbackDetail::Timing {
                tendency: TimingTendency::Early,
            } => "Try waiting just a little longer!".to_string(),
            FeedbackDetail::Timing {
                tendency: TimingTendency::OnTime,
            } => "Your timing is great!".to_string(),
        }
    }
}
