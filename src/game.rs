//! Frame driver and round controls
//!
//! Owns the world plus the pending input, turns wall-clock timestamps into
//! capped simulation steps, and hands a snapshot to the presentation layer
//! after every step. Pausing stops stepping; resuming resets the frame clock
//! so the first frame back is not a catch-up step.

use glam::Vec2;

use crate::settings::{Difficulty, Settings};
use crate::sim::{GamePhase, GameState, Snapshot, TickInput, tick};
use crate::tuning::Tuning;

/// Presentation seam: receives a read-only view once per frame
pub trait Renderer {
    fn render(&mut self, view: &Snapshot);
}

/// A play session
pub struct Game {
    pub state: GameState,
    pub settings: Settings,
    input: TickInput,
    /// Timestamp of the previous frame (seconds)
    last_time: Option<f64>,
    /// Balance used instead of the difficulty defaults
    tuning_override: Option<Tuning>,
}

impl Game {
    pub fn new(seed: u64, settings: Settings) -> Self {
        let mut state = GameState::new(seed, settings.difficulty);
        state.particle_cap = settings.max_particles();
        Self {
            state,
            settings,
            input: TickInput::default(),
            last_time: None,
            tuning_override: None,
        }
    }

    /// Use explicit balance for every following round
    pub fn set_tuning_override(&mut self, tuning: Tuning) {
        self.tuning_override = Some(tuning);
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.settings.difficulty = difficulty;
    }

    /// Begin a fresh round with the current difficulty, reusing the RNG stream
    pub fn start(&mut self) {
        let difficulty = self.settings.difficulty;
        let tuning = self
            .tuning_override
            .clone()
            .unwrap_or_else(|| Tuning::for_difficulty(difficulty));
        self.state.difficulty = difficulty;
        self.state.tuning = tuning.sanitized();
        self.state.particle_cap = self.settings.max_particles();
        self.state.start_round();
        self.input = TickInput::default();
        self.last_time = None;
    }

    pub fn restart(&mut self) {
        log::info!("Restarting round");
        self.start();
    }

    pub fn pause(&mut self) -> bool {
        self.state.pause()
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.state.resume();
        if resumed {
            self.last_time = None;
        }
        resumed
    }

    pub fn to_menu(&mut self) {
        self.state.to_menu();
        self.last_time = None;
    }

    /// Held-direction intent (any length; normalized by the simulation)
    pub fn set_move_intent(&mut self, intent: Vec2) {
        self.input.move_intent = intent;
    }

    /// Request a dash toward an arena-space point on the next step
    pub fn queue_dash(&mut self, target: Vec2) {
        self.input.dash_target = Some(target);
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// One animation frame at `now` seconds.
    ///
    /// Steps the simulation by the elapsed time (capped), then renders.
    /// Returns whether another frame should be scheduled.
    pub fn frame<R: Renderer>(&mut self, now: f64, renderer: &mut R) -> bool {
        if !self.state.is_running() {
            self.last_time = None;
            return false;
        }

        let dt = match self.last_time {
            Some(prev) => (now - prev).max(0.0) as f32,
            None => 0.0,
        };
        self.last_time = Some(now);

        tick(&mut self.state, &self.input, dt);
        self.input.dash_target = None;

        let mut view = Snapshot::capture(&self.state);
        if !self.settings.effective_screen_shake() {
            view.shake = 0.0;
        }
        renderer.render(&view);

        if self.state.phase == GamePhase::GameOver {
            self.last_time = None;
        }
        self.state.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Snapshot>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, view: &Snapshot) {
            self.frames.push(view.clone());
        }
    }

    fn started() -> Game {
        let mut game = Game::new(77, Settings::default());
        game.start();
        game
    }

    #[test]
    fn test_frame_not_scheduled_from_menu() {
        let mut game = Game::new(77, Settings::default());
        let mut r = Recorder::default();
        assert!(!game.frame(0.0, &mut r));
        assert!(r.frames.is_empty());
    }

    #[test]
    fn test_frame_caps_stall() {
        let mut game = started();
        let mut r = Recorder::default();
        game.frame(1.0, &mut r);
        let before = game.state.time_left;
        // Ten-second stall
        game.frame(11.0, &mut r);
        assert!(before - game.state.time_left <= crate::consts::MAX_FRAME_DT + 1e-5);
        assert_eq!(r.frames.len(), 2);
    }

    #[test]
    fn test_resume_resets_frame_clock() {
        let mut game = started();
        let mut r = Recorder::default();
        game.frame(0.0, &mut r);
        game.frame(0.016, &mut r);
        assert!(game.pause());
        assert!(!game.frame(5.0, &mut r));

        assert!(game.resume());
        let before = game.state.time_left;
        game.frame(60.0, &mut r);
        assert_eq!(game.state.time_left, before, "first frame after resume is a zero step");
    }

    #[test]
    fn test_dash_is_one_shot() {
        let mut game = started();
        let mut r = Recorder::default();
        let target = game.state.player.pos + Vec2::new(80.0, 0.0);
        game.queue_dash(target);
        game.frame(0.0, &mut r);
        game.frame(0.02, &mut r);
        assert!(game.state.player.dash_cooldown > 0.0);
        assert!(game.input.dash_target.is_none());
    }

    #[test]
    fn test_shake_hidden_when_disabled() {
        let settings = Settings {
            screen_shake: false,
            ..Settings::default()
        };
        let mut game = Game::new(3, settings);
        game.start();
        game.state.shake.bump(1.0, 10.0);
        let mut r = Recorder::default();
        game.frame(0.0, &mut r);
        assert_eq!(r.frames[0].shake, 0.0);
    }

    #[test]
    fn test_tuning_override_applies_on_start() {
        let mut game = Game::new(3, Settings::with_difficulty(Difficulty::Hard));
        let tuning = Tuning {
            round_seconds: 12.0,
            ..Tuning::default()
        };
        game.set_tuning_override(tuning);
        game.start();
        assert_eq!(game.state.time_left, 12.0);
        game.restart();
        assert_eq!(game.state.time_left, 12.0);
    }
}
