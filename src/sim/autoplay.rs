//! Autoplay bot for demo/attract mode
//!
//! Waits for the perfect cue, then taps after a seeded human-ish reaction
//! delay. Sometimes it hesitates too long and misses, which is the point.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::session::Session;

/// Reaction delay range in ticks
const MIN_REACTION_TICKS: u32 = 0;
const MAX_REACTION_TICKS: u32 = 9;

/// Seeded tapping bot
#[derive(Debug, Clone)]
pub struct Autoplay {
    rng: Pcg32,
    /// Ticks left before the planned tap
    pending: Option<u32>,
}

impl Autoplay {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            pending: None,
        }
    }

    /// Decide whether to tap this tick. Call after `Session::tick`.
    pub fn wants_tap(&mut self, session: &Session) -> bool {
        if !session.is_running() {
            self.pending = None;
            return false;
        }
        match self.pending {
            Some(0) => {
                self.pending = None;
                true
            }
            Some(ticks) => {
                self.pending = Some(ticks - 1);
                false
            }
            None => {
                if session.perfect_cue() {
                    let delay = self.rng.random_range(MIN_REACTION_TICKS..=MAX_REACTION_TICKS);
                    if delay == 0 {
                        return true;
                    }
                    self.pending = Some(delay - 1);
                }
                false
            }
        }
    }
}
