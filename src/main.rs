//! Emoji Survival entry point
//!
//! Native builds run a headless round driven by a simple autopilot and print
//! the final summary as JSON:
//!
//! `emoji-survival [easy|normal|hard] [seed] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::Vec2;

    use emoji_survival::sim::{GamePhase, GameState, Snapshot};
    use emoji_survival::{Difficulty, Game, Renderer, Settings, Tuning};

    const FRAME: f64 = 1.0 / 60.0;

    /// Logs the HUD about once per simulated second
    struct LogRenderer {
        frames: u64,
        meteor_seen: bool,
        convoy_seen: bool,
    }

    impl Renderer for LogRenderer {
        fn render(&mut self, view: &Snapshot) {
            self.frames += 1;
            if view.meteor_warning.active && !self.meteor_seen {
                log::info!("☄️ Meteor warning ({:.1}s)", view.meteor_warning.remaining);
            }
            if view.convoy_warning.active && !self.convoy_seen {
                log::info!("🚗 Convoy warning ({:.1}s)", view.convoy_warning.remaining);
            }
            self.meteor_seen = view.meteor_warning.active;
            self.convoy_seen = view.convoy_warning.active;

            if self.frames % 60 == 0 {
                let hud = &view.hud;
                log::info!(
                    "t={:>5.1} score={:<5} gems={:<3} hp={}/{} sprites={} vehicles={}",
                    hud.time_left,
                    hud.score,
                    hud.gems,
                    hud.health,
                    hud.max_health,
                    view.sprites.len(),
                    view.vehicles()
                );
            }
        }
    }

    /// Chase the closest gem while leaning away from anything dangerous
    fn autopilot(state: &GameState) -> (Vec2, Option<Vec2>) {
        let me = state.player.pos;
        let goal = state
            .pickups
            .iter()
            .map(|p| p.pos)
            .min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)));

        let mut push = Vec2::ZERO;
        let threats = state
            .hazards
            .iter()
            .map(|h| h.pos)
            .chain(state.fires.iter().map(|f| f.pos))
            .chain(state.comets.iter().chain(&state.vehicles).map(|m| m.pos));
        for pos in threats {
            let away = me - pos;
            let d = away.length();
            if d > 0.0 && d < 140.0 {
                push += away / d * (140.0 - d) / 140.0;
            }
        }

        let seek = goal.map_or(Vec2::ZERO, |g| (g - me).normalize_or_zero());
        let intent = seek + push * 2.5;
        let dash = (push.length() > 0.8).then(|| me + push.normalize_or_zero() * 110.0);
        (intent, dash)
    }

    pub fn run() {
        let mut args = std::env::args().skip(1);
        let difficulty = args
            .next()
            .and_then(|s| Difficulty::from_str(&s))
            .unwrap_or_default();
        let seed = args
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0x5eed);
        let tuning_json = args.next().and_then(|path| match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("Could not read {}: {}", path, e);
                None
            }
        });

        log::info!("Emoji Survival (headless) {} seed {}", difficulty.as_str(), seed);

        let mut game = Game::new(seed, Settings::with_difficulty(difficulty));
        if tuning_json.is_some() {
            game.set_tuning_override(Tuning::load_or_default(tuning_json.as_deref(), difficulty));
        }
        game.start();

        let mut renderer = LogRenderer {
            frames: 0,
            meteor_seen: false,
            convoy_seen: false,
        };
        let mut now = 0.0;
        loop {
            let (intent, dash) = autopilot(&game.state);
            game.set_move_intent(intent);
            if let Some(target) = dash {
                game.queue_dash(target);
            }
            if !game.frame(now, &mut renderer) {
                break;
            }
            now += FRAME;
        }

        if game.state.phase != GamePhase::GameOver {
            log::warn!("Round stopped in phase {:?}", game.state.phase);
            return;
        }
        match serde_json::to_string_pretty(&game.state.outcome) {
            Ok(json) => println!("{json}"),
            Err(e) => log::error!("Could not encode summary: {}", e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web builds drive `Game::frame` from the host page
}
