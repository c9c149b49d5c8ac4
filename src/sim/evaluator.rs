//! Round evaluator: tap classification and streak/combo bookkeeping

use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;
use crate::consts::{PERFECT_BAND_FRACTION, PERFECT_BAND_MAX, PERFECT_BAND_MIN};

/// Result of a tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapOutcome {
    /// Base ring not between the shrinking rings
    Miss,
    /// Base ring bracketed
    Win,
    /// Bracketed and inside the perfect band around the midpoint
    Perfect,
}

impl TapOutcome {
    /// PERFECT counts as a win
    #[inline]
    pub fn is_win(&self) -> bool {
        !matches!(self, TapOutcome::Miss)
    }
}

/// Width of the perfect band for a given ring gap
#[inline]
pub fn perfect_band(gap_between: f32) -> f32 {
    (gap_between * PERFECT_BAND_FRACTION).clamp(PERFECT_BAND_MIN, PERFECT_BAND_MAX)
}

/// Classify a tap against the current ring sizes
pub fn classify_tap(size1: f32, size2: f32, base_size: f32) -> TapOutcome {
    if !(size2 < base_size && base_size < size1) {
        return TapOutcome::Miss;
    }
    let mid = (size1 + size2) / 2.0;
    let thickness = perfect_band(size1 - size2);
    if (base_size - mid).abs() <= thickness / 2.0 {
        TapOutcome::Perfect
    } else {
        TapOutcome::Win
    }
}

/// Streak and combo counters for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundState {
    /// Consecutive wins since the last loss
    pub streak: u32,
    /// Consecutive PERFECT wins
    pub combo: u32,
    /// Highest streak ever reached
    pub best_streak: u32,
    /// Streak at the most recent loss
    pub last_streak: u32,
}

impl RoundState {
    /// Fresh counters carrying a previously persisted best
    pub fn with_best(best_streak: u32) -> Self {
        Self {
            best_streak,
            ..Self::default()
        }
    }
}

/// Outcome of applying a win or loss
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundUpdate {
    pub round: RoundState,
    /// Cycle rate to use from the next tick on
    pub rate: f32,
    /// Score to hand to the score store, if any
    pub report: Option<u32>,
    /// Whether this update set a new best streak
    pub new_best: bool,
}

/// Apply a successful tap
pub fn on_win(state: RoundState, perfect: bool, difficulty: Difficulty) -> RoundUpdate {
    let streak = state.streak + 1;
    let combo = if perfect { state.combo + 1 } else { 0 };
    let new_best = streak > state.best_streak;
    let best_streak = if new_best { streak } else { state.best_streak };

    RoundUpdate {
        round: RoundState {
            streak,
            combo,
            best_streak,
            last_streak: state.last_streak,
        },
        rate: difficulty.rate_for_streak(streak),
        report: new_best.then_some(best_streak),
        new_best,
    }
}

/// Apply a missed tap. The best streak is always re-reported.
pub fn on_loss(state: RoundState, difficulty: Difficulty) -> RoundUpdate {
    RoundUpdate {
        round: RoundState {
            streak: 0,
            combo: 0,
            best_streak: state.best_streak,
            last_streak: state.streak,
        },
        rate: difficulty.base_rate(),
        report: Some(state.best_streak),
        new_best: false,
    }
}
