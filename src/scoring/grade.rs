//! Feedback tiers for accuracy and final scores

use serde::{Deserialize, Serialize};

/// Verbal feedback tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    /// Below 50
    KeepPracticing,
    /// 50 and up
    Fair,
    /// 70 and up
    Good,
    /// 85 and up
    VeryGood,
    /// 95 and up
    Excellent,
}

impl Grade {
    /// Tier for a score or accuracy in `[0, 100]`.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 95.0 => Self::Excellent,
            s if s >= 85.0 => Self::VeryGood,
            s if s >= 70.0 => Self::Good,
            s if s >= 50.0 => Self::Fair,
            _ => Self::KeepPracticing,
        }
    }

    /// Message shown next to the score.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! Very precise measurement!",
            Self::VeryGood => "Very good! Good precision!",
            Self::Good => "Good! Correct measurement!",
            Self::Fair => "Not bad, but you can do better!",
            Self::KeepPracticing => "Keep practicing!",
        }
    }
}

/// Traffic-light band used to color scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    /// 90 and up
    High,
    /// 70 and up
    Medium,
    /// Below 70
    Low,
}

impl ScoreBand {
    /// Band for a score or accuracy in `[0, 100]`.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::High
        } else if score >= 70.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Display color.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::High => "#4CAF50",
            Self::Medium => "#FF9800",
            Self::Low => "#F44336",
        }
    }
}
