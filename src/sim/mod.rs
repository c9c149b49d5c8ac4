//! Deterministic game core
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Timers run on simulated time, never the wall clock
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod cycle;
pub mod difficulty;
pub mod evaluator;
pub mod session;
pub mod timer;

pub use autoplay::Autoplay;
pub use cycle::{
    ConfigError, CycleState, RingConfig, RingFrame, RingGeometry, advance, geometry, should_wrap,
    step,
};
pub use difficulty::Difficulty;
pub use evaluator::{RoundState, RoundUpdate, TapOutcome, classify_tap, on_loss, on_win};
pub use session::{Feedback, GameEvent, GamePhase, Session};
pub use timer::{TimerEvent, TimerHandle, Timers};
