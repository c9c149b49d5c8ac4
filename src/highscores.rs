//! High score list
//!
//! Top 5 best streaks, highest first, persisted through a [`Storage`].

use serde::{Deserialize, Serialize};

use crate::consts::MAX_HIGH_SCORES;
use crate::persistence::{self, PersistError, Storage};

/// Something that keeps the top scores
pub trait ScoreStore {
    /// Up to `MAX_HIGH_SCORES` scores, descending
    fn top_scores(&self) -> Vec<u32>;
    /// Insert a score and persist the list
    fn record_score(&mut self, score: u32) -> Result<(), PersistError>;
}

/// Sorted list of best streaks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub scores: Vec<u32>,
}

impl HighScores {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "ring_tap_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self { scores: Vec::new() }
    }

    /// Check if a score would change the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 || self.scores.contains(&score) {
            return false;
        }
        if self.scores.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.scores.last().map(|&s| score > s).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.scores.iter().position(|&s| score > s);
        Some(rank.unwrap_or(self.scores.len()) + 1)
    }

    /// Add a score. Returns the rank achieved or None if it didn't qualify.
    /// Re-adding a score already on the list is a no-op.
    pub fn add_score(&mut self, score: u32) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.scores.insert(rank - 1, score);
        self.scores.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.scores.first().copied()
    }

    /// Load from storage. Missing or unreadable data starts a fresh list.
    pub fn load(storage: &dyn Storage) -> Self {
        match persistence::load::<HighScores>(storage, Self::STORAGE_KEY) {
            Ok(Some(mut scores)) => {
                // Stored data is trusted for content, not for order
                scores.scores.sort_unstable_by(|a, b| b.cmp(a));
                scores.scores.dedup();
                scores.scores.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.scores.len());
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("High scores unreadable ({}), starting fresh", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), PersistError> {
        persistence::store(storage, Self::STORAGE_KEY, self)?;
        log::info!("High scores saved ({} entries)", self.scores.len());
        Ok(())
    }
}

/// High score list bound to its storage backend
pub struct ScoreBoard {
    scores: HighScores,
    storage: Box<dyn Storage>,
}

impl ScoreBoard {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        let scores = HighScores::load(storage.as_ref());
        Self { scores, storage }
    }

    pub fn scores(&self) -> &HighScores {
        &self.scores
    }
}

impl ScoreStore for ScoreBoard {
    fn top_scores(&self) -> Vec<u32> {
        self.scores.scores.clone()
    }

    /// The in-memory list is updated even when saving fails
    fn record_score(&mut self, score: u32) -> Result<(), PersistError> {
        if let Some(rank) = self.scores.add_score(score) {
            log::info!("Score {} entered the high scores at #{}", score, rank);
        }
        self.scores.save(self.storage.as_mut())
    }
}
