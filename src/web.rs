//! Browser bindings
//!
//! The page drives `frame(now_ms)` from `requestAnimationFrame` and calls
//! `tap()` on pointer/key input. Rendering stays on the JS side; it reads
//! ring sizes back through the getters.

use std::collections::VecDeque;

use wasm_bindgen::prelude::*;

use crate::consts::*;
use crate::persistence::LocalStorage;
use crate::sim::{GameEvent, GamePhase, Session, TapOutcome};
use crate::{ScoreBoard, Settings};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Ring Tap (web) starting...");
}

/// Game instance owned by the page
#[wasm_bindgen]
pub struct WebGame {
    session: Session,
    accumulator: f32,
    last_time: f64,
    /// Events not yet taken by JS, oldest dropped past `MAX_QUEUED_EVENTS`
    events: VecDeque<String>,
}

#[wasm_bindgen]
impl WebGame {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebGame {
        let settings = Settings::load(&LocalStorage);
        let scores = ScoreBoard::new(Box::new(LocalStorage));
        WebGame {
            session: Session::new(settings, Box::new(scores)),
            accumulator: 0.0,
            last_time: 0.0,
            events: VecDeque::new(),
        }
    }

    /// Run as many fixed ticks as the elapsed wall time calls for
    pub fn frame(&mut self, now_ms: f64) {
        if self.last_time == 0.0 {
            self.last_time = now_ms;
        }
        let elapsed = ((now_ms - self.last_time) / 1000.0) as f32;
        self.last_time = now_ms;
        self.accumulator += elapsed;

        let mut substeps = 0;
        while self.accumulator >= TICK_DT && substeps < MAX_SUBSTEPS {
            self.session.tick(TICK_DT);
            self.accumulator -= TICK_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            // Drop the backlog after a stall (tab in background)
            self.accumulator = 0.0;
        }
        self.collect_events();
    }

    /// Returns "miss", "win", "perfect", or "" if the tap was ignored
    pub fn tap(&mut self) -> String {
        let outcome = self.session.tap();
        self.collect_events();
        match outcome {
            Some(TapOutcome::Miss) => "miss",
            Some(TapOutcome::Win) => "win",
            Some(TapOutcome::Perfect) => "perfect",
            None => "",
        }
        .to_string()
    }

    pub fn toggle_pause(&mut self) {
        self.session.toggle_pause();
        self.collect_events();
    }

    pub fn restart(&mut self) {
        self.session.start_round();
        self.collect_events();
    }

    /// Re-read settings after the settings screen saved them
    pub fn reload_settings(&mut self) {
        self.session.apply_settings(Settings::load(&LocalStorage));
    }

    /// Pending events as strings, e.g. "countdown:3", "win:perfect"
    pub fn take_events(&mut self) -> Vec<String> {
        self.events.drain(..).collect()
    }

    pub fn base_size(&self) -> f32 {
        self.session.frame().geometry.base_size
    }

    pub fn outer1(&self) -> f32 {
        self.session.frame().geometry.outer1
    }

    pub fn outer2(&self) -> f32 {
        self.session.frame().geometry.outer2
    }

    pub fn perfect_cue(&self) -> bool {
        self.session.perfect_cue()
    }

    /// Countdown number to show, or -1 when not counting down
    pub fn countdown(&self) -> i32 {
        match self.session.phase() {
            GamePhase::Countdown { remaining } => remaining as i32,
            GamePhase::Paused { countdown: Some(remaining) } => remaining as i32,
            _ => -1,
        }
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.session.phase(), GamePhase::Paused { .. })
    }

    pub fn streak(&self) -> u32 {
        self.session.round().streak
    }

    pub fn combo(&self) -> u32 {
        self.session.round().combo
    }

    pub fn best_streak(&self) -> u32 {
        self.session.round().best_streak
    }

    pub fn last_streak(&self) -> u32 {
        self.session.round().last_streak
    }

    pub fn top_scores(&self) -> Vec<u32> {
        self.session.top_scores()
    }
}

impl WebGame {
    fn collect_events(&mut self) {
        for event in self.session.drain_events() {
            if self.events.len() == MAX_QUEUED_EVENTS {
                self.events.pop_front();
            }
            self.events.push_back(match event {
                GameEvent::CountdownTick(n) => format!("countdown:{n}"),
                GameEvent::Go => "go".to_string(),
                GameEvent::Win { perfect: true, .. } => "win:perfect".to_string(),
                GameEvent::Win { .. } => "win".to_string(),
                GameEvent::Loss { .. } => "loss".to_string(),
                GameEvent::NewBest(n) => format!("best:{n}"),
                GameEvent::CycleWrapped => "wrap".to_string(),
                GameEvent::Paused => "paused".to_string(),
                GameEvent::Resumed => "resumed".to_string(),
            });
        }
    }
}

impl Default for WebGame {
    fn default() -> Self {
        Self::new()
    }
}
