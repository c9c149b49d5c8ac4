//! Game session: owns all mutable round state
//!
//! Exactly two entry points mutate a session: [`Session::tick`] (fixed
//! timestep) and [`Session::tap`] (player input). Both finish their update
//! before returning, so neither ever observes a half-applied change from the
//! other.

use std::collections::VecDeque;

use super::cycle::{CycleState, RingConfig, RingFrame, geometry, step};
use super::evaluator::{RoundState, RoundUpdate, TapOutcome, on_loss, on_win};
use super::timer::{TimerHandle, Timers};
use crate::consts::*;
use crate::highscores::ScoreStore;
use crate::settings::Settings;

/// Round-level state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// 3-2-1-GO before play; `remaining` is 0 during the GO delay
    Countdown { remaining: u32 },
    /// Rings shrinking, taps are scored
    Running,
    /// Frozen; `countdown` holds the countdown value to resume into, if any
    Paused { countdown: Option<u32> },
}

/// Discrete events for presentation collaborators (sound, haptics, effects)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    CountdownTick(u32),
    Go,
    Win { perfect: bool, streak: u32, combo: u32 },
    Loss { last_streak: u32 },
    NewBest(u32),
    CycleWrapped,
    Paused,
    Resumed,
}

/// Consumer of win/loss feedback. Fire-and-forget.
pub trait Feedback {
    fn on_win(&mut self, perfect: bool);
    fn on_loss(&mut self);
    fn on_countdown(&mut self, _remaining: u32) {}
    fn on_go(&mut self) {}
    fn on_new_best(&mut self, _best: u32) {}
}

/// Countdown timer payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountdownTimer {
    /// Repeating one-second step
    Step,
    /// One-shot delay after reaching zero
    Go,
}

/// Handles of the countdown currently in flight
#[derive(Debug, Clone, Copy, Default)]
struct Countdown {
    step: Option<TimerHandle>,
    go: Option<TimerHandle>,
}

/// A single player's game session
pub struct Session {
    config: RingConfig,
    settings: Settings,
    cycle: CycleState,
    round: RoundState,
    phase: GamePhase,
    timers: Timers<CountdownTimer>,
    countdown: Countdown,
    /// Sampled once per tick from the rendered geometry
    perfect_cue: bool,
    time_ticks: u64,
    events: VecDeque<GameEvent>,
    scores: Box<dyn ScoreStore>,
}

impl Session {
    /// New session with default ring geometry, starting in the countdown
    pub fn new(settings: Settings, scores: Box<dyn ScoreStore>) -> Self {
        Self::with_config(RingConfig::default(), settings, scores)
    }

    /// New session with custom ring geometry. An invalid config is logged
    /// and replaced by the defaults.
    pub fn with_config(
        config: RingConfig,
        settings: Settings,
        scores: Box<dyn ScoreStore>,
    ) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("Invalid ring config ({}), using defaults", e);
                RingConfig::default()
            }
        };
        let best = scores.top_scores().first().copied().unwrap_or(0);
        let mut session = Self {
            config,
            cycle: CycleState::new(settings.difficulty.base_rate()),
            settings,
            round: RoundState::with_best(best),
            phase: GamePhase::Countdown {
                remaining: COUNTDOWN_FROM,
            },
            timers: Timers::new(),
            countdown: Countdown::default(),
            perfect_cue: false,
            time_ticks: 0,
            events: VecDeque::new(),
            scores,
        };
        log::info!(
            "New session: difficulty={}, best={}",
            session.settings.difficulty.as_str(),
            best
        );
        session.start_round();
        session
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> RoundState {
        self.round
    }

    pub fn cycle(&self) -> CycleState {
        self.cycle
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Whether a tap right now would score PERFECT, as of the last tick
    pub fn perfect_cue(&self) -> bool {
        self.perfect_cue
    }

    /// Current ring sizes for rendering
    pub fn frame(&self) -> RingFrame {
        RingFrame::new(&self.cycle, &self.config)
    }

    pub fn top_scores(&self) -> Vec<u32> {
        self.scores.top_scores()
    }

    /// Replace the settings snapshot. Rate follows the new difficulty.
    pub fn apply_settings(&mut self, settings: Settings) {
        if settings.difficulty != self.settings.difficulty {
            log::info!(
                "Difficulty {} -> {}",
                self.settings.difficulty.as_str(),
                settings.difficulty.as_str()
            );
            self.cycle = self
                .cycle
                .with_rate(settings.difficulty.rate_for_streak(self.round.streak));
        }
        self.settings = settings;
    }

    /// Enter the 3-2-1-GO countdown, replacing any countdown in flight
    pub fn start_round(&mut self) {
        self.cancel_countdown();
        self.cycle = self.cycle.restarted();
        self.perfect_cue = false;
        self.phase = GamePhase::Countdown {
            remaining: COUNTDOWN_FROM,
        };
        self.countdown.step = Some(
            self.timers
                .schedule_repeating(COUNTDOWN_STEP_SECS, CountdownTimer::Step),
        );
        self.emit(GameEvent::CountdownTick(COUNTDOWN_FROM));
        log::info!("Countdown started");
    }

    fn cancel_countdown(&mut self) {
        if let Some(handle) = self.countdown.step.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.countdown.go.take() {
            self.timers.cancel(handle);
        }
    }

    /// Pause or resume. Scoring state is untouched.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Running => {
                self.phase = GamePhase::Paused { countdown: None };
                self.emit(GameEvent::Paused);
            }
            GamePhase::Countdown { remaining } => {
                self.phase = GamePhase::Paused {
                    countdown: Some(remaining),
                };
                self.emit(GameEvent::Paused);
            }
            GamePhase::Paused { countdown } => {
                self.phase = match countdown {
                    Some(remaining) => GamePhase::Countdown { remaining },
                    None => GamePhase::Running,
                };
                self.emit(GameEvent::Resumed);
            }
        }
    }

    /// Advance one fixed timestep
    pub fn tick(&mut self, dt: f32) {
        if matches!(self.phase, GamePhase::Paused { .. }) {
            return;
        }
        self.time_ticks += 1;

        self.timers.advance(dt);
        while let Some(event) = self.timers.pop_due() {
            self.on_timer(event.handle, event.kind);
        }

        if self.phase == GamePhase::Running {
            let (cycle, wrapped) = step(self.cycle, dt, &self.config);
            self.cycle = cycle;
            if wrapped {
                self.emit(GameEvent::CycleWrapped);
            }
            self.perfect_cue = self.frame().perfect_cue;
        } else {
            self.perfect_cue = false;
        }
    }

    fn on_timer(&mut self, handle: TimerHandle, kind: CountdownTimer) {
        match kind {
            CountdownTimer::Step => {
                let GamePhase::Countdown { remaining } = self.phase else {
                    return;
                };
                let remaining = remaining.saturating_sub(1);
                self.phase = GamePhase::Countdown { remaining };
                if remaining > 0 {
                    self.emit(GameEvent::CountdownTick(remaining));
                } else {
                    self.timers.cancel(handle);
                    self.countdown.step = None;
                    self.countdown.go = Some(
                        self.timers
                            .schedule_once(COUNTDOWN_GO_DELAY_SECS, CountdownTimer::Go),
                    );
                    self.emit(GameEvent::Go);
                }
            }
            CountdownTimer::Go => {
                self.countdown.go = None;
                self.phase = GamePhase::Running;
                log::info!("Round running at rate {:.3}", self.cycle.rate);
            }
        }
    }

    /// Score a tap. Ignored outside of `Running`.
    pub fn tap(&mut self) -> Option<TapOutcome> {
        if self.phase != GamePhase::Running {
            log::debug!("Tap ignored in {:?}", self.phase);
            return None;
        }

        let geo = geometry(self.cycle.phase, &self.config);
        let outcome = geo.classify();
        log::debug!(
            "Tap at phase {:.3}: outer1={:.1} outer2={:.1} -> {:?}",
            self.cycle.phase,
            geo.outer1,
            geo.outer2,
            outcome
        );

        let difficulty = self.settings.difficulty;
        let update = match outcome {
            TapOutcome::Miss => on_loss(self.round, difficulty),
            TapOutcome::Win => on_win(self.round, false, difficulty),
            TapOutcome::Perfect => on_win(self.round, true, difficulty),
        };
        self.apply_update(update, outcome.is_win());

        match outcome {
            TapOutcome::Miss => {
                self.emit(GameEvent::Loss {
                    last_streak: self.round.last_streak,
                });
                if self.settings.restart_after_loss {
                    self.start_round();
                }
            }
            TapOutcome::Win | TapOutcome::Perfect => {
                self.emit(GameEvent::Win {
                    perfect: outcome == TapOutcome::Perfect,
                    streak: self.round.streak,
                    combo: self.round.combo,
                });
                if update.new_best {
                    self.emit(GameEvent::NewBest(self.round.best_streak));
                }
            }
        }
        Some(outcome)
    }

    /// A win starts the next cycle at phase 0 so one window can only be
    /// scored once. A miss only drops the rate; the rings keep shrinking
    /// until they wrap (or the countdown restarts them).
    fn apply_update(&mut self, update: RoundUpdate, restart_cycle: bool) {
        self.round = update.round;
        // Rate and phase land together; the next tick sees both or neither.
        self.cycle = CycleState {
            phase: if restart_cycle { 0.0 } else { self.cycle.phase },
            rate: update.rate,
        };
        self.perfect_cue = self.frame().perfect_cue;

        if let Some(score) = update.report {
            if let Err(e) = self.scores.record_score(score) {
                log::warn!("Could not persist score {}: {}", score, e);
            }
        }
    }

    /// Queue an event, dropping the oldest if nobody has drained in a while
    fn emit(&mut self, event: GameEvent) {
        if self.events.len() == MAX_QUEUED_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Take all queued events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    /// Deliver queued events to a feedback collaborator
    pub fn dispatch(&mut self, feedback: &mut dyn Feedback) {
        for event in self.drain_events() {
            match event {
                GameEvent::Win { perfect, .. } => feedback.on_win(perfect),
                GameEvent::Loss { .. } => feedback.on_loss(),
                GameEvent::CountdownTick(n) => feedback.on_countdown(n),
                GameEvent::Go => feedback.on_go(),
                GameEvent::NewBest(best) => feedback.on_new_best(best),
                GameEvent::CycleWrapped | GameEvent::Paused | GameEvent::Resumed => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::ScoreBoard;
    use crate::persistence::MemoryStorage;
    use crate::sim::Difficulty;

    fn session(settings: Settings) -> Session {
        Session::new(settings, Box::new(ScoreBoard::new(Box::new(MemoryStorage::new()))))
    }

    fn run_ticks(session: &mut Session, n: u32) {
        for _ in 0..n {
            session.tick(TICK_DT);
        }
    }

    /// Tick until the tap preview matches `wanted`
    fn tick_until(session: &mut Session, wanted: TapOutcome) {
        for _ in 0..10_000 {
            if session.frame().preview == wanted {
                return;
            }
            session.tick(TICK_DT);
        }
        panic!("never reached {:?}", wanted);
    }

    #[test]
    fn test_countdown_to_running() {
        let mut s = session(Settings::default());
        assert_eq!(s.phase(), GamePhase::Countdown { remaining: 3 });

        run_ticks(&mut s, 60);
        assert_eq!(s.phase(), GamePhase::Countdown { remaining: 2 });
        run_ticks(&mut s, 120);
        assert_eq!(s.phase(), GamePhase::Countdown { remaining: 0 });
        run_ticks(&mut s, 29);
        assert!(!s.is_running());
        run_ticks(&mut s, 1);
        assert!(s.is_running());

        let events = s.drain_events();
        assert_eq!(
            events,
            vec![
                GameEvent::CountdownTick(3),
                GameEvent::CountdownTick(2),
                GameEvent::CountdownTick(1),
                GameEvent::Go,
            ]
        );
    }

    #[test]
    fn test_cycle_frozen_during_countdown() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 120);
        assert_eq!(s.cycle().phase, 0.0);
        assert!(s.tap().is_none());
    }

    #[test]
    fn test_restart_replaces_pending_countdown() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 90);
        s.start_round();
        // Old countdown would have reached zero at tick 180
        run_ticks(&mut s, 90);
        assert_eq!(s.phase(), GamePhase::Countdown { remaining: 2 });
        run_ticks(&mut s, 119);
        assert_eq!(s.phase(), GamePhase::Countdown { remaining: 0 });
        run_ticks(&mut s, 1);
        assert!(s.is_running());
        assert_eq!(s.timers.pending(), 0);
    }

    #[test]
    fn test_pause_freezes_cycle_and_countdown() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 210);
        assert!(s.is_running());
        run_ticks(&mut s, 10);
        let phase = s.cycle().phase;

        s.toggle_pause();
        assert_eq!(s.phase(), GamePhase::Paused { countdown: None });
        run_ticks(&mut s, 100);
        assert_eq!(s.cycle().phase, phase);
        assert!(s.tap().is_none());

        s.toggle_pause();
        assert!(s.is_running());
        s.tick(TICK_DT);
        assert!(s.cycle().phase > phase);
    }

    #[test]
    fn test_pause_during_countdown_resumes_countdown() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 70);
        s.toggle_pause();
        assert_eq!(s.phase(), GamePhase::Paused { countdown: Some(2) });
        run_ticks(&mut s, 500);
        s.toggle_pause();
        assert_eq!(s.phase(), GamePhase::Countdown { remaining: 2 });
    }

    #[test]
    fn test_win_speeds_up_and_restarts_cycle() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 210);
        tick_until(&mut s, TapOutcome::Win);

        let outcome = s.tap();
        assert!(outcome.is_some_and(|o| o.is_win()));
        assert_eq!(s.round().streak, 1);
        assert_eq!(s.round().best_streak, 1);
        assert_eq!(s.cycle().phase, 0.0);
        assert!((s.cycle().rate - Difficulty::Normal.rate_for_streak(1)).abs() < 1e-6);
        assert_eq!(s.top_scores(), vec![1]);
        assert!(s.is_running());
    }

    #[test]
    fn test_miss_resets_rate_and_keeps_running() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 210);
        tick_until(&mut s, TapOutcome::Win);
        s.tap();
        // Phase 0 is always a miss
        assert_eq!(s.tap(), Some(TapOutcome::Miss));
        assert_eq!(s.round().streak, 0);
        assert_eq!(s.round().last_streak, 1);
        assert_eq!(s.round().best_streak, 1);
        assert_eq!(s.cycle().rate, Difficulty::Normal.base_rate());
        assert!(s.is_running());
    }

    #[test]
    fn test_plain_miss_keeps_cycle_running() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 215);
        let phase = s.cycle().phase;
        assert!(phase > 0.0);

        assert_eq!(s.tap(), Some(TapOutcome::Miss));
        assert_eq!(s.cycle().phase, phase);
        assert_eq!(s.cycle().rate, Difficulty::Normal.base_rate());
        s.tick(TICK_DT);
        assert!(s.cycle().phase > phase);
    }

    #[test]
    fn test_miss_with_restart_enters_countdown() {
        let settings = Settings {
            restart_after_loss: true,
            ..Settings::default()
        };
        let mut s = session(settings);
        run_ticks(&mut s, 210);
        s.drain_events();
        assert_eq!(s.tap(), Some(TapOutcome::Miss));
        assert_eq!(s.phase(), GamePhase::Countdown { remaining: 3 });
        assert_eq!(
            s.drain_events(),
            vec![GameEvent::Loss { last_streak: 0 }, GameEvent::CountdownTick(3)]
        );
    }

    #[test]
    fn test_perfect_cue_tracks_frame() {
        let mut s = session(Settings::default());
        run_ticks(&mut s, 210);
        let mut saw_cue = false;
        for _ in 0..120 {
            s.tick(TICK_DT);
            assert_eq!(s.perfect_cue(), s.frame().perfect_cue);
            saw_cue |= s.perfect_cue();
        }
        assert!(saw_cue);
    }

    #[test]
    fn test_difficulty_change_rederives_rate() {
        let mut s = session(Settings::default());
        s.apply_settings(Settings {
            difficulty: Difficulty::Hard,
            ..Settings::default()
        });
        assert_eq!(s.cycle().rate, Difficulty::Hard.base_rate());
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let bad = RingConfig {
            gap: -10.0,
            ..RingConfig::default()
        };
        let s = Session::with_config(
            bad,
            Settings::default(),
            Box::new(ScoreBoard::new(Box::new(MemoryStorage::new()))),
        );
        assert_eq!(*s.config(), RingConfig::default());
    }

    #[test]
    fn test_undrained_events_are_capped() {
        let mut s = session(Settings::default());
        // Ten minutes of wraps with nobody listening
        run_ticks(&mut s, 60 * 600);
        s.toggle_pause();
        let events = s.drain_events();
        assert_eq!(events.len(), MAX_QUEUED_EVENTS);
        assert_eq!(events.last(), Some(&GameEvent::Paused));
        assert!(events[..MAX_QUEUED_EVENTS - 1]
            .iter()
            .all(|e| *e == GameEvent::CycleWrapped));
    }

    #[test]
    fn test_dispatch_routes_events() {
        #[derive(Default)]
        struct Recorder {
            wins: Vec<bool>,
            losses: u32,
            countdown: Vec<u32>,
            gos: u32,
            bests: Vec<u32>,
        }
        impl Feedback for Recorder {
            fn on_win(&mut self, perfect: bool) {
                self.wins.push(perfect);
            }
            fn on_loss(&mut self) {
                self.losses += 1;
            }
            fn on_countdown(&mut self, remaining: u32) {
                self.countdown.push(remaining);
            }
            fn on_go(&mut self) {
                self.gos += 1;
            }
            fn on_new_best(&mut self, best: u32) {
                self.bests.push(best);
            }
        }

        let mut s = session(Settings::default());
        run_ticks(&mut s, 210);
        tick_until(&mut s, TapOutcome::Perfect);
        s.tap();
        s.tap();

        let mut rec = Recorder::default();
        s.dispatch(&mut rec);
        assert_eq!(rec.countdown, vec![3, 2, 1]);
        assert_eq!(rec.gos, 1);
        assert_eq!(rec.wins, vec![true]);
        assert_eq!(rec.bests, vec![1]);
        assert_eq!(rec.losses, 1);
        assert!(s.drain_events().is_empty());
    }
}
