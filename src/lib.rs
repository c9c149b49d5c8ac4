//! Ring Tap - a reflex timing game
//!
//! Core modules:
//! - `sim`: Deterministic game core (cycle engine, tap evaluation, session)
//! - `persistence`: Key-value storage backends with a versioned envelope
//! - `highscores`: Top-5 best streak list
//! - `settings`: Player preferences (difficulty, restart, audio, visuals)

pub mod highscores;
pub mod persistence;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use highscores::{HighScores, ScoreBoard, ScoreStore};
pub use settings::{Settings, VisualPreset};
pub use sim::{Difficulty, Session, TapOutcome};

/// Game configuration constants
pub mod consts {
    /// Fixed tick rate (60 Hz)
    pub const TICK_RATE: u32 = 60;
    /// Fixed timestep in seconds
    pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;
    /// Maximum ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Ring geometry defaults
    pub const BASE_SIZE: f32 = 180.0;
    pub const RING_GAP: f32 = 90.0;
    pub const MAX_OVERSIZE: f32 = 160.0;
    pub const MIN_UNDERSIZE: f32 = 2.0;
    /// Slack added to `MIN_UNDERSIZE` when detecting the end of a cycle
    pub const WRAP_EPSILON: f32 = 0.5;

    /// Perfect band: fraction of the ring gap, clamped to [MIN, MAX]
    pub const PERFECT_BAND_FRACTION: f32 = 0.30;
    pub const PERFECT_BAND_MIN: f32 = 8.0;
    pub const PERFECT_BAND_MAX: f32 = 24.0;

    /// Countdown starts at this number (3-2-1-GO)
    pub const COUNTDOWN_FROM: u32 = 3;
    /// Seconds between countdown numbers
    pub const COUNTDOWN_STEP_SECS: f32 = 1.0;
    /// Delay after the countdown reaches zero before play resumes
    pub const COUNTDOWN_GO_DELAY_SECS: f32 = 0.5;

    /// Number of entries kept on the high score list
    pub const MAX_HIGH_SCORES: usize = 5;

    /// Undrained events kept before the oldest are dropped
    pub const MAX_QUEUED_EVENTS: usize = 64;
}
