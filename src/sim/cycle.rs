//! Cycle engine: phase advance, ring geometry, wrap detection
//!
//! Every consumer of ring sizes (renderer, perfect cue, tap evaluation) goes
//! through [`geometry`]. There is no second copy of the shrink formula.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::evaluator::{TapOutcome, classify_tap};
use crate::consts::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("inner ring starts at {inner_start}, at or below the wrap threshold {threshold}")]
    CycleTooShort { inner_start: f32, threshold: f32 },
}

/// Ring geometry constants, loadable from JSON
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Fixed target ring size
    pub base_size: f32,
    /// Distance between the two shrinking rings
    pub gap: f32,
    /// How far the outer ring starts beyond the base ring
    pub max_oversize: f32,
    /// Floor for both shrinking rings
    pub min_undersize: f32,
    /// Slack on the wrap check
    pub wrap_epsilon: f32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            base_size: BASE_SIZE,
            gap: RING_GAP,
            max_oversize: MAX_OVERSIZE,
            min_undersize: MIN_UNDERSIZE,
            wrap_epsilon: WRAP_EPSILON,
        }
    }
}

impl RingConfig {
    /// Parse and validate a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject constants that would break ring ordering or end every cycle
    /// on its first tick
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("base_size", self.base_size),
            ("gap", self.gap),
            ("max_oversize", self.max_oversize),
            ("min_undersize", self.min_undersize),
            ("wrap_epsilon", self.wrap_epsilon),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }
        for (field, value) in [
            ("gap", self.gap),
            ("min_undersize", self.min_undersize),
            ("wrap_epsilon", self.wrap_epsilon),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        let inner_start = self.start_size() - self.gap;
        let threshold = self.min_undersize + self.wrap_epsilon;
        if inner_start <= threshold {
            return Err(ConfigError::CycleTooShort {
                inner_start,
                threshold,
            });
        }
        Ok(())
    }

    /// Outer ring size at phase 0
    #[inline]
    pub fn start_size(&self) -> f32 {
        self.base_size + self.max_oversize
    }

    /// Floor both rings clamp to
    #[inline]
    pub fn end_size(&self) -> f32 {
        self.min_undersize
    }
}

/// Phase and speed of the current shrink cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleState {
    /// Normalized progress through the cycle (0 at start)
    pub phase: f32,
    /// Phase units per second
    pub rate: f32,
}

impl CycleState {
    pub fn new(rate: f32) -> Self {
        debug_assert!(rate > 0.0, "cycle rate must be positive");
        Self { phase: 0.0, rate }
    }

    /// Same rate, phase back at 0
    #[inline]
    pub fn restarted(self) -> Self {
        Self { phase: 0.0, ..self }
    }

    /// Same phase, new rate
    #[inline]
    pub fn with_rate(self, rate: f32) -> Self {
        debug_assert!(rate > 0.0, "cycle rate must be positive");
        Self { rate, ..self }
    }
}

/// Ring sizes derived from a phase. Never stored, always recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingGeometry {
    pub base_size: f32,
    /// Larger shrinking ring
    pub outer1: f32,
    /// Smaller shrinking ring, always `gap` inside `outer1` until clamped
    pub outer2: f32,
}

impl RingGeometry {
    /// What a tap against this geometry would score
    #[inline]
    pub fn classify(&self) -> TapOutcome {
        classify_tap(self.outer1, self.outer2, self.base_size)
    }
}

/// Ring sizes for a phase
pub fn geometry(phase: f32, config: &RingConfig) -> RingGeometry {
    let start = config.start_size();
    let end = config.end_size();
    let outer1 = (start - (start - end) * phase).max(end);
    let outer2 = (outer1 - config.gap).max(end);
    RingGeometry {
        base_size: config.base_size,
        outer1,
        outer2,
    }
}

/// Whether the inner ring has collapsed onto the floor
#[inline]
pub fn should_wrap(outer2: f32, config: &RingConfig) -> bool {
    outer2 <= config.min_undersize + config.wrap_epsilon
}

/// Advance phase by `rate * dt`
#[inline]
pub fn advance(state: CycleState, dt: f32) -> CycleState {
    CycleState {
        phase: state.phase + state.rate * dt,
        ..state
    }
}

/// One tick: advance, then reset phase to exactly 0 if the cycle ended.
/// Returns the new state and whether a wrap happened.
pub fn step(state: CycleState, dt: f32, config: &RingConfig) -> (CycleState, bool) {
    let next = advance(state, dt);
    let geo = geometry(next.phase, config);
    if should_wrap(geo.outer2, config) {
        (next.restarted(), true)
    } else {
        (next, false)
    }
}

/// Snapshot handed to the renderer each tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingFrame {
    pub phase: f32,
    pub geometry: RingGeometry,
    /// What a tap right now would score
    pub preview: TapOutcome,
    /// Continuous PERFECT indicator
    pub perfect_cue: bool,
}

impl RingFrame {
    pub fn new(state: &CycleState, config: &RingConfig) -> Self {
        let geometry = geometry(state.phase, config);
        let preview = geometry.classify();
        Self {
            phase: state.phase,
            geometry,
            preview,
            perfect_cue: preview == TapOutcome::Perfect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_geometry_at_phase_zero() {
        let geo = geometry(0.0, &RingConfig::default());
        assert_eq!(geo.outer1, 340.0);
        assert_eq!(geo.outer2, 250.0);
        assert_eq!(geo.base_size, 180.0);
    }

    #[test]
    fn test_geometry_clamps_past_end() {
        let config = RingConfig::default();
        let geo = geometry(5.0, &config);
        assert_eq!(geo.outer1, config.min_undersize);
        assert_eq!(geo.outer2, config.min_undersize);
    }

    #[test]
    fn test_should_wrap_threshold() {
        let config = RingConfig::default();
        assert!(should_wrap(2.5, &config));
        assert!(should_wrap(2.0, &config));
        assert!(!should_wrap(2.51, &config));
    }

    #[test]
    fn test_step_wraps_to_exact_zero() {
        let config = RingConfig::default();
        // outer2 hits the floor once outer1 <= 92.5, i.e. phase ~0.732
        let state = CycleState {
            phase: 0.73,
            rate: 0.5,
        };
        let (next, wrapped) = step(state, 1.0 / 60.0, &config);
        assert!(wrapped);
        assert_eq!(next.phase, 0.0);
        assert_eq!(next.rate, 0.5);
    }

    #[test]
    fn test_step_without_wrap_is_advance() {
        let config = RingConfig::default();
        let state = CycleState::new(0.6);
        let (next, wrapped) = step(state, 0.5, &config);
        assert!(!wrapped);
        assert!((next.phase - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_frame_cue_matches_classification() {
        let config = RingConfig::default();
        let mut state = CycleState::new(0.35);
        for _ in 0..200 {
            let frame = RingFrame::new(&state, &config);
            let geo = frame.geometry;
            let outcome = classify_tap(geo.outer1, geo.outer2, config.base_size);
            assert_eq!(frame.preview, outcome);
            assert_eq!(frame.perfect_cue, outcome == TapOutcome::Perfect);
            state = step(state, crate::consts::TICK_DT, &config).0;
        }
    }

    #[test]
    fn test_config_from_json_partial() {
        let config = RingConfig::from_json(r#"{"gap": 60.0}"#).unwrap();
        assert_eq!(config.gap, 60.0);
        assert_eq!(config.base_size, BASE_SIZE);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(RingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_negative_gap_rejected() {
        // Would put outer2 above outer1
        let err = RingConfig::from_json(r#"{"gap": -10.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Negative { field: "gap", .. }));
    }

    #[test]
    fn test_negative_floor_rejected() {
        let err = RingConfig::from_json(r#"{"min_undersize": -1.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Negative { field: "min_undersize", .. }));
    }

    #[test]
    fn test_cycle_that_wraps_immediately_rejected() {
        // Outer ring starts at 80, so the inner ring starts at -10, below the floor
        let err = RingConfig::from_json(r#"{"max_oversize": -100.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::CycleTooShort { .. }));
    }

    #[test]
    fn test_non_finite_rejected() {
        let config = RingConfig {
            base_size: f32::NAN,
            ..RingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { field: "base_size", .. })
        ));
    }

    #[test]
    fn test_bad_json_is_json_error() {
        assert!(matches!(RingConfig::from_json("{gap"), Err(ConfigError::Json(_))));
    }

    proptest! {
        #[test]
        fn prop_valid_config_keeps_rings_ordered(
            base in 1.0f32..400.0,
            gap in 0.0f32..200.0,
            oversize in 0.0f32..300.0,
            floor in 0.0f32..20.0,
            phase in 0.0f32..=1.0,
        ) {
            let config = RingConfig {
                base_size: base,
                gap,
                max_oversize: oversize,
                min_undersize: floor,
                wrap_epsilon: WRAP_EPSILON,
            };
            if config.validate().is_ok() {
                let geo = geometry(phase, &config);
                prop_assert!(geo.outer2 <= geo.outer1);
                let (_, wrapped) = step(CycleState::new(0.35), 0.0, &config);
                prop_assert!(!wrapped);
            }
        }

        #[test]
        fn prop_geometry_ordered_and_floored(phase in 0.0f32..=1.0) {
            let config = RingConfig::default();
            let geo = geometry(phase, &config);
            prop_assert!(geo.outer2 <= geo.outer1);
            prop_assert!(geo.outer1 >= config.min_undersize);
            prop_assert!(geo.outer2 >= config.min_undersize);
        }

        #[test]
        fn prop_wrap_iff_inner_at_floor(phase in 0.0f32..=1.0, dt in 0.0f32..0.1) {
            let config = RingConfig::default();
            let state = CycleState { phase, rate: 0.45 };
            let (next, wrapped) = step(state, dt, &config);
            let advanced = advance(state, dt);
            let geo = geometry(advanced.phase, &config);
            prop_assert_eq!(wrapped, geo.outer2 <= config.min_undersize + 0.5);
            if wrapped {
                prop_assert_eq!(next.phase, 0.0);
            } else {
                prop_assert!(next.phase >= state.phase);
            }
        }
    }
}
