//! Game state and core simulation types
//!
//! One explicit world structure owns the player, every entity pool, the
//! singleton slots, the schedulers and the random source. Subsystems take
//! `&mut GameState` and never close over ambient state.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::dragon::Dragon;
use super::entities::{Fire, Hazard, Missile, Particle, ParticleStyle, Pickup, TimedItem};
use super::player::Player;
use super::schedule::SpawnQueue;
use super::sequencer::{MajorEventGate, Warning};
use super::spawn::{self, Schedulers};
use super::tornado::Tornado;
use crate::consts::MAX_PARTICLES;
use crate::settings::Difficulty;
use crate::tick_down;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// No round running
    Menu,
    /// Active gameplay
    Playing,
    /// Frozen; resumes to the phase it was paused from
    Paused,
    /// Death fall in progress, no gameplay interaction
    Dying,
    /// Round ended
    GameOver,
}

/// Why a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    TimeUp,
    Died,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::TimeUp => "time expired",
            GameOverReason::Died => "died",
        }
    }

    /// Headline for the game-over panel
    pub fn banner(&self) -> &'static str {
        match self {
            GameOverReason::TimeUp => "⏳ Time Up",
            GameOverReason::Died => "💥 You Died",
        }
    }
}

/// Final tally of a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub reason: GameOverReason,
    pub score: u64,
    pub gems: u32,
    /// Score plus the per-gem bonus
    pub final_score: u64,
}

/// Camera shake request (presentation applies it)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScreenShake {
    pub time: f32,
    pub intensity: f32,
}

impl ScreenShake {
    /// Combine with a new request, keeping the stronger of each component
    pub fn bump(&mut self, time: f32, intensity: f32) {
        self.time = self.time.max(time);
        self.intensity = self.intensity.max(intensity);
    }

    pub fn decay(&mut self, dt: f32) {
        tick_down(&mut self.time, dt);
        if self.time == 0.0 {
            self.intensity = 0.0;
        }
    }
}

/// Uniform float in [min, max)
#[inline]
pub(crate) fn rnd(rng: &mut Pcg32, min: f32, max: f32) -> f32 {
    min + rng.random::<f32>() * (max - min)
}

/// Bernoulli roll; 0.0 never passes, 1.0 always passes
#[inline]
pub(crate) fn chance(rng: &mut Pcg32, p: f32) -> bool {
    rng.random::<f32>() < p
}

/// Uniform integer in [min, max]
#[inline]
pub(crate) fn rnd_count(rng: &mut Pcg32, min: u32, max: u32) -> u32 {
    if max <= min {
        min
    } else {
        rng.random_range(min..=max)
    }
}

/// Complete world state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    /// Injected random source
    pub rng: Pcg32,
    pub difficulty: Difficulty,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Phase to return to on resume
    paused_from: GamePhase,
    /// Simulated seconds since the round started
    pub clock: f32,
    /// Countdown remaining (seconds)
    pub time_left: f32,
    pub score: u64,
    pub gems: u32,
    pub player: Player,
    pub pickups: Vec<Pickup>,
    pub hazards: Vec<Hazard>,
    pub fires: Vec<Fire>,
    pub comets: Vec<Missile>,
    pub vehicles: Vec<Missile>,
    pub dragon: Option<Dragon>,
    pub tornado: Option<Tornado>,
    /// Blocks tornado respawn after one despawns
    pub tornado_cooldown: f32,
    pub food: Option<TimedItem>,
    pub clock_item: Option<TimedItem>,
    pub meteor: Warning,
    pub convoy: Warning,
    pub gate: MajorEventGate,
    pub schedulers: Schedulers,
    /// Deferred (staggered) spawns
    pub queue: SpawnQueue,
    pub shake: ScreenShake,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    pub particle_cap: usize,
    /// Set once the round ends
    pub outcome: Option<GameSummary>,
    next_id: u32,
}

impl GameState {
    /// Idle state (menu) with the built-in balance for `difficulty`
    pub fn new(seed: u64, difficulty: Difficulty) -> Self {
        Self::with_tuning(seed, difficulty, Tuning::for_difficulty(difficulty))
    }

    /// Idle state (menu) with explicit balance
    pub fn with_tuning(seed: u64, difficulty: Difficulty, tuning: Tuning) -> Self {
        let tuning = tuning.sanitized();
        let mut rng = Pcg32::seed_from_u64(seed);
        let schedulers = Schedulers::new(&tuning, &mut rng);
        Self {
            seed,
            rng,
            difficulty,
            player: Player::new(&tuning.player),
            time_left: tuning.round_seconds,
            gate: MajorEventGate::new(tuning.major_event_spacing),
            schedulers,
            tuning,
            phase: GamePhase::Menu,
            paused_from: GamePhase::Playing,
            clock: 0.0,
            score: 0,
            gems: 0,
            pickups: Vec::new(),
            hazards: Vec::new(),
            fires: Vec::new(),
            comets: Vec::new(),
            vehicles: Vec::new(),
            dragon: None,
            tornado: None,
            tornado_cooldown: 0.0,
            food: None,
            clock_item: None,
            meteor: Warning::default(),
            convoy: Warning::default(),
            queue: SpawnQueue::default(),
            shake: ScreenShake::default(),
            particles: Vec::new(),
            particle_cap: MAX_PARTICLES,
            outcome: None,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Reset everything and begin a round (also used for restart)
    pub fn start_round(&mut self) {
        let tuning = &self.tuning;
        self.player = Player::new(&tuning.player);
        self.time_left = tuning.round_seconds;
        self.gate = MajorEventGate::new(tuning.major_event_spacing);
        self.schedulers = Schedulers::new(tuning, &mut self.rng);
        self.clock = 0.0;
        self.score = 0;
        self.gems = 0;
        self.pickups.clear();
        self.hazards.clear();
        self.fires.clear();
        self.comets.clear();
        self.vehicles.clear();
        self.dragon = None;
        self.tornado = None;
        self.tornado_cooldown = 0.0;
        self.food = None;
        self.clock_item = None;
        self.meteor = Warning::default();
        self.convoy = Warning::default();
        self.queue.clear();
        self.shake = ScreenShake::default();
        self.particles.clear();
        self.outcome = None;
        self.phase = GamePhase::Playing;

        spawn::spawn_initial(self);
        log::info!(
            "Round started: {} ({:.0}s, {} hazards)",
            self.difficulty.as_str(),
            self.time_left,
            self.hazards.len()
        );
    }

    /// Freeze the round; entity and timer values are left untouched
    pub fn pause(&mut self) -> bool {
        match self.phase {
            GamePhase::Playing | GamePhase::Dying => {
                self.paused_from = self.phase;
                self.phase = GamePhase::Paused;
                true
            }
            _ => false,
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = self.paused_from;
        true
    }

    /// Abandon any round and return to the menu
    pub fn to_menu(&mut self) {
        self.queue.clear();
        self.phase = GamePhase::Menu;
    }

    /// Whether the frame driver should keep stepping
    pub fn is_running(&self) -> bool {
        matches!(self.phase, GamePhase::Playing | GamePhase::Dying)
    }

    /// Enter the death sequence (no-op if already dying)
    pub fn begin_death(&mut self, normal: Vec2) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.phase = GamePhase::Dying;
        self.player.start_fall(normal, &self.tuning.player);
        self.shake.bump(0.6, 12.0);
        self.spawn_burst(self.player.pos, 14, ParticleStyle::Boom);
        log::info!("Player down at {:.1}s", self.clock);
    }

    /// Terminate the round exactly once
    pub fn end_round(&mut self, reason: GameOverReason) {
        if self.outcome.is_some() {
            return;
        }
        let final_score = self
            .score
            .saturating_add(u64::from(self.gems) * self.tuning.pickups.final_gem_bonus);
        let summary = GameSummary {
            reason,
            score: self.score,
            gems: self.gems,
            final_score,
        };
        log::info!(
            "Round over ({}): score {} gems {} final {}",
            reason.as_str(),
            summary.score,
            summary.gems,
            summary.final_score
        );
        self.outcome = Some(summary);
        self.queue.clear();
        self.phase = GamePhase::GameOver;
    }

    /// Radial particle burst
    pub fn spawn_burst(&mut self, pos: Vec2, count: usize, style: ParticleStyle) {
        for _ in 0..count {
            if self.particles.len() >= self.particle_cap {
                return;
            }
            let angle = rnd(&mut self.rng, 0.0, std::f32::consts::TAU);
            let speed = rnd(&mut self.rng, 40.0, 200.0);
            let life = rnd(&mut self.rng, 0.35, 0.9);
            let size = rnd(&mut self.rng, 6.0, 12.0);
            self.particles.push(Particle {
                pos,
                vel: Vec2::from_angle(angle) * speed,
                style,
                life,
                size,
                homing: false,
            });
        }
    }

    /// Short trail of particles from `from` that chase the player, launched
    /// toward `to`
    pub fn spawn_trail(&mut self, from: Vec2, to: Vec2, count: usize) {
        let dir = (to - from).normalize_or_zero();
        let dist = from.distance(to);
        for i in 0..count {
            if self.particles.len() >= self.particle_cap {
                return;
            }
            let t = i as f32 / count.max(1) as f32;
            let life = rnd(&mut self.rng, 0.25, 0.45);
            self.particles.push(Particle {
                pos: from + dir * dist * t * 0.3,
                vel: dir * dist / life.max(0.01),
                style: ParticleStyle::Sparkle,
                life,
                size: 8.0,
                homing: true,
            });
        }
    }

    /// Decay visual particles; homing ones steer at the player's current
    /// position and vanish on arrival
    pub fn update_particles(&mut self, dt: f32) {
        let target = self.player.pos;
        for p in self.particles.iter_mut() {
            tick_down(&mut p.life, dt);
            if !p.homing {
                p.pos += p.vel * dt;
                p.vel *= 0.98;
                continue;
            }
            let to = target - p.pos;
            let dist = to.length();
            let speed = p.vel.length();
            if dist <= speed * dt {
                p.pos = target;
                p.life = 0.0;
            } else {
                p.vel = to / dist * speed;
                p.pos += p.vel * dt;
            }
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Combined entity count the tornado uses as its clutter trigger
    pub fn clutter(&self) -> usize {
        self.pickups.len() + self.hazards.len() + self.fires.len()
    }
}
