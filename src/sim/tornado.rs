//! Tornado sweep
//!
//! Crosses the arena along the diagonal between two opposite off-screen
//! corners, optionally zigzagging, and swallows every pickup, hazard and fire
//! bolt inside its pull radius. Comets, vehicles, the dragon, the player and
//! the timed specials are never touched.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{Body, ParticleStyle};
use super::state::{GameState, chance, rnd};
use crate::consts::{ARENA_H, ARENA_W};

/// The tornado singleton
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tornado {
    pub start: Vec2,
    pub end: Vec2,
    pub elapsed: f32,
    pub duration: f32,
    pub zigzag: bool,
    /// Perpendicular zigzag amplitude (already clamped)
    pub amplitude: f32,
    /// Zigzag periods over the whole path
    pub waves: f32,
    pub pull_radius: f32,
    /// Current position
    pub pos: Vec2,
}

impl Tornado {
    /// Position at `t` seconds into the sweep
    pub fn position_at(&self, t: f32) -> Vec2 {
        let u = if self.duration > 0.0 {
            (t / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let base = self.start.lerp(self.end, u);
        if !self.zigzag {
            return base;
        }

        let normal = (self.end - self.start).normalize_or_zero().perp();
        // Taper to zero at both ends of the path
        let envelope = (std::f32::consts::PI * u).sin();
        let wave = (std::f32::consts::TAU * self.waves * u).sin();
        base + normal * self.amplitude * envelope * wave
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Random pair of opposite off-screen corners
fn pick_corners(state: &mut GameState, offset: f32) -> (Vec2, Vec2) {
    let corners = [
        Vec2::new(-offset, -offset),
        Vec2::new(ARENA_W + offset, -offset),
        Vec2::new(ARENA_W + offset, ARENA_H + offset),
        Vec2::new(-offset, ARENA_H + offset),
    ];
    let i = state.rng.random_range(0..corners.len());
    (corners[i], corners[(i + 2) % corners.len()])
}

/// Spawn check: empty slot, cooldown over, and a cluttered arena
pub fn try_spawn_tornado(state: &mut GameState, dt: f32) {
    let t = state.tuning.tornado.clone();
    if !t.enabled || state.tornado.is_some() {
        return;
    }
    if state.tornado_cooldown > 0.0 {
        return;
    }
    if !state.schedulers.tornado.advance(dt) {
        return;
    }
    if state.clutter() < t.density || !chance(&mut state.rng, t.chance) {
        return;
    }

    let (start, end) = pick_corners(state, t.corner_offset);
    let zigzag = chance(&mut state.rng, t.zigzag_chance);
    let amplitude = rnd(&mut state.rng, t.zigzag_amp_min, t.zigzag_amp_max)
        .min(ARENA_W * t.max_amp_fraction);
    let waves = rnd(&mut state.rng, t.zigzag_waves_min, t.zigzag_waves_max);
    let duration = rnd(&mut state.rng, t.duration_min, t.duration_max);

    log::info!(
        "Tornado spawned ({:.1}s{}, clutter {})",
        duration,
        if zigzag { ", zigzag" } else { "" },
        state.clutter()
    );
    state.tornado = Some(Tornado {
        start,
        end,
        elapsed: 0.0,
        duration,
        zigzag,
        amplitude,
        waves,
        pull_radius: t.pull_radius,
        pos: start,
    });
}

/// Remove everything in `pool` strictly inside `radius` of `center`
fn sweep<T: Body>(pool: &mut Vec<T>, center: Vec2, radius: f32, swallowed: &mut Vec<Vec2>) {
    pool.retain(|e| {
        let inside = e.pos().distance(center) < radius;
        if inside {
            swallowed.push(e.pos());
        }
        !inside
    });
}

/// Move the tornado, swallow nearby entities and despawn it when done
pub fn update_tornado(state: &mut GameState, dt: f32) {
    let Some(tornado) = state.tornado.as_mut() else {
        return;
    };
    tornado.elapsed = (tornado.elapsed + dt).min(tornado.duration);
    tornado.pos = tornado.position_at(tornado.elapsed);
    let (center, radius, finished) = (tornado.pos, tornado.pull_radius, tornado.finished());

    let mut swallowed = Vec::new();
    sweep(&mut state.pickups, center, radius, &mut swallowed);
    sweep(&mut state.hazards, center, radius, &mut swallowed);
    sweep(&mut state.fires, center, radius, &mut swallowed);
    for pos in swallowed {
        state.spawn_burst(pos, 4, ParticleStyle::Swirl);
    }

    if finished {
        state.tornado = None;
        state.tornado_cooldown = state.tuning.tornado.cooldown;
        log::debug!("Tornado dissipated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_center;
    use crate::settings::Difficulty;
    use crate::sim::entities::Hazard;

    fn round() -> GameState {
        let mut state = GameState::new(21, Difficulty::Normal);
        state.start_round();
        state
    }

    fn parked(pos: Vec2, radius: f32) -> Tornado {
        Tornado {
            start: pos,
            end: pos,
            elapsed: 0.0,
            duration: 10.0,
            zigzag: false,
            amplitude: 0.0,
            waves: 0.0,
            pull_radius: radius,
            pos,
        }
    }

    fn hazard_at(state: &mut GameState, pos: Vec2) -> u32 {
        let id = state.next_entity_id();
        state.hazards.push(Hazard {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: 16.0,
            life: 10.0,
            despawning: false,
        });
        id
    }

    #[test]
    fn test_pull_radius_boundary() {
        let mut state = round();
        state.hazards.clear();
        state.pickups.clear();
        let center = arena_center();
        let r = 70.0;
        state.tornado = Some(parked(center, r));

        let near = hazard_at(&mut state, center + Vec2::new(r - 1.0, 0.0));
        let far = hazard_at(&mut state, center + Vec2::new(0.0, r + 1.0));

        update_tornado(&mut state, 0.0);
        let ids: Vec<u32> = state.hazards.iter().map(|h| h.id).collect();
        assert!(!ids.contains(&near));
        assert!(ids.contains(&far));
    }

    #[test]
    fn test_missiles_and_player_exempt() {
        let mut state = round();
        let center = state.player.pos;
        state.tornado = Some(parked(center, 200.0));
        state.queue.push(0.0, crate::sim::schedule::Deferred::Vehicle);
        crate::sim::schedule::run_deferred(&mut state);
        let vehicles = state.vehicles.len();
        let player = state.player.pos;

        update_tornado(&mut state, 0.0);
        assert_eq!(state.vehicles.len(), vehicles);
        assert_eq!(state.player.pos, player);
    }

    #[test]
    fn test_zigzag_tapers_at_endpoints() {
        let mut tornado = parked(Vec2::ZERO, 70.0);
        tornado.end = Vec2::new(1000.0, 600.0);
        tornado.zigzag = true;
        tornado.amplitude = 150.0;
        tornado.waves = 2.25;

        assert!(tornado.position_at(0.0).distance(tornado.start) < 1e-3);
        assert!(tornado.position_at(tornado.duration).distance(tornado.end) < 1e-3);
        let mid = tornado.position_at(tornado.duration * 0.1);
        let straight = tornado.start.lerp(tornado.end, 0.1);
        assert!(mid.distance(straight) > 1.0);
    }

    #[test]
    fn test_spawn_requires_clutter_and_cooldown() {
        let mut state = round();
        state.tuning.tornado.chance = 1.0;
        let step = state.tuning.tornado.check_interval + 0.01;

        // Too little clutter
        state.tuning.tornado.density = 1000;
        try_spawn_tornado(&mut state, step);
        assert!(state.tornado.is_none());

        state.tuning.tornado.density = 0;
        state.tornado_cooldown = 5.0;
        try_spawn_tornado(&mut state, step);
        assert!(state.tornado.is_none());

        state.tornado_cooldown = 0.0;
        try_spawn_tornado(&mut state, step);
        let tornado = state.tornado.as_ref().expect("tornado spawned");
        assert!(tornado.amplitude <= ARENA_W * state.tuning.tornado.max_amp_fraction);
    }

    #[test]
    fn test_despawn_sets_cooldown() {
        let mut state = round();
        let mut tornado = parked(Vec2::new(-500.0, -500.0), 10.0);
        tornado.duration = 1.0;
        state.tornado = Some(tornado);

        update_tornado(&mut state, 0.6);
        assert!(state.tornado.is_some());
        update_tornado(&mut state, 0.6);
        assert!(state.tornado.is_none());
        assert_eq!(state.tornado_cooldown, state.tuning.tornado.cooldown);
    }
}
