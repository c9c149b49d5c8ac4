//! Ring Tap entry point
//!
//! Native builds run a headless autoplay session and log the result.
//! The browser build starts from `ring_tap::web` instead.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use ring_tap::consts::*;
    use ring_tap::persistence::{FileStorage, MemoryStorage, Storage};
    use ring_tap::sim::{Autoplay, Feedback, GamePhase, TapOutcome};
    use ring_tap::{Difficulty, ScoreBoard, Session, Settings};

    /// Directory to persist scores/settings in; unset keeps everything in memory
    const DATA_DIR_ENV: &str = "RING_TAP_DATA_DIR";

    /// Logs feedback instead of playing sounds
    #[derive(Default)]
    struct LogFeedback {
        wins: u32,
        perfects: u32,
        losses: u32,
    }

    impl Feedback for LogFeedback {
        fn on_win(&mut self, perfect: bool) {
            self.wins += 1;
            if perfect {
                self.perfects += 1;
            }
        }

        fn on_loss(&mut self) {
            self.losses += 1;
        }

        fn on_countdown(&mut self, remaining: u32) {
            log::info!("{}...", remaining);
        }

        fn on_go(&mut self) {
            log::info!("GO!");
        }

        fn on_new_best(&mut self, best: u32) {
            log::info!("New best streak: {}", best);
        }
    }

    fn storage() -> Box<dyn Storage> {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) => {
                log::info!("Persisting to {}", dir);
                Box::new(FileStorage::new(dir))
            }
            Err(_) => Box::new(MemoryStorage::new()),
        }
    }

    pub fn run() {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let settings_storage = storage();
        let mut settings = Settings::load(settings_storage.as_ref());
        if let Some(arg) = args.first() {
            match Difficulty::from_str(arg) {
                Some(d) => settings.difficulty = d,
                None => log::warn!(
                    "Unknown difficulty '{}', using {}",
                    arg,
                    settings.difficulty.as_str()
                ),
            }
        }
        let seed: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(0x5EED);
        let seconds: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(60);

        log::info!(
            "Ring Tap (native) autoplay: difficulty={}, seed={}, {}s",
            settings.difficulty.as_str(),
            seed,
            seconds
        );

        let mut session = Session::new(settings, Box::new(ScoreBoard::new(storage())));
        let mut bot = Autoplay::new(seed);
        let mut feedback = LogFeedback::default();

        for _ in 0..seconds * TICK_RATE {
            session.tick(TICK_DT);
            if bot.wants_tap(&session) {
                if let Some(outcome) = session.tap() {
                    let round = session.round();
                    match outcome {
                        TapOutcome::Miss => log::info!("Miss (streak was {})", round.last_streak),
                        TapOutcome::Win => log::debug!("Win, streak {}", round.streak),
                        TapOutcome::Perfect => {
                            log::debug!("PERFECT, streak {} combo {}", round.streak, round.combo)
                        }
                    }
                }
            }
            session.dispatch(&mut feedback);
        }

        if matches!(session.phase(), GamePhase::Countdown { .. }) {
            log::info!("Stopped during countdown");
        }

        let round = session.round();
        println!(
            "wins={} perfect={} misses={} streak={} best={} rate={:.3}",
            feedback.wins,
            feedback.perfects,
            feedback.losses,
            round.streak,
            round.best_streak,
            session.cycle().rate
        );
        println!("high scores: {:?}", session.top_scores());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is ring_tap::web::start, this is just to satisfy the compiler
}
