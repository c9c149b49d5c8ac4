//! Difficulty presets: streak -> cycle rate

use serde::{Deserialize, Serialize};

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Rate with no streak; also what a loss resets to
    pub fn base_rate(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.30,
            Difficulty::Normal => 0.35,
            Difficulty::Hard => 0.45,
        }
    }

    /// Rate increase per consecutive win
    fn rate_per_win(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.0,
            Difficulty::Normal => 0.045,
            Difficulty::Hard => 0.06,
        }
    }

    /// Ceiling on the rate
    pub fn max_rate(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.30,
            Difficulty::Normal => 1.2,
            Difficulty::Hard => 1.4,
        }
    }

    /// Cycle rate for a given streak
    pub fn rate_for_streak(&self, streak: u32) -> f32 {
        (self.base_rate() + streak as f32 * self.rate_per_win()).min(self.max_rate())
    }
}
