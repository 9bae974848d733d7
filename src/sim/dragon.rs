//! Dragon attacker
//!
//! A single dragon flies in from one side, drops onto a perch, fires a rapid
//! burst of bolts at the player and then flees:
//! `Approaching -> Dropping -> Spitting -> Leaving -> (removed)`.
//! At most one state change happens per tick.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entities::Fire;
use super::sequencer::MajorEvent;
use super::state::{GameState, chance, rnd, rnd_count};
use crate::consts::{ARENA_H, ARENA_W};
use crate::tick_down;

/// Dragon behaviour states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragonState {
    Approaching,
    Dropping,
    Spitting,
    Leaving,
}

/// The dragon singleton
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dragon {
    pub pos: Vec2,
    pub target_x: f32,
    pub surface_y: f32,
    pub state: DragonState,
    pub speed: f32,
    pub burst_total: u32,
    pub burst_interval: f32,
    pub burst_count: u32,
    pub burst_timer: f32,
    pub leave_delay: f32,
    /// Only used while leaving
    pub vel: Vec2,
    /// Shadow drop below the perch height
    pub shadow_offset: f32,
}

impl Dragon {
    /// Dragon entering from off-screen left or right
    pub fn spawn(state: &mut GameState) -> Self {
        let t = &state.tuning.dragon;
        let rng = &mut state.rng;
        let from_left = rng.random_bool(0.5);
        let entry_x = if from_left {
            -t.entry_offset_x
        } else {
            ARENA_W + t.entry_offset_x
        };
        Self {
            pos: Vec2::new(entry_x, t.entry_y),
            target_x: rnd(rng, t.landing_inset, ARENA_W - t.landing_inset),
            surface_y: rnd(rng, t.surface_min, t.surface_max),
            state: DragonState::Approaching,
            speed: rnd(rng, t.speed_min, t.speed_max),
            burst_total: rnd_count(rng, t.burst_min, t.burst_max),
            burst_interval: rnd(rng, t.burst_interval_min, t.burst_interval_max),
            burst_count: 0,
            burst_timer: t.first_bolt_delay,
            leave_delay: t.leave_delay,
            vel: Vec2::ZERO,
            shadow_offset: t.shadow_offset,
        }
    }

    /// Where the landing shadow sits while the dragon is inbound or perched
    pub fn shadow(&self) -> Option<Vec2> {
        match self.state {
            DragonState::Leaving => None,
            _ => Some(Vec2::new(self.target_x, self.surface_y + self.shadow_offset)),
        }
    }
}

/// Spawn roll for the dragon (hard difficulty only, gated by the major-event cooldown)
pub fn try_spawn_dragon(state: &mut GameState, dt: f32) {
    if !state.tuning.dragon.enabled {
        return;
    }
    if !state.schedulers.dragon.advance(dt) {
        return;
    }
    let (min, max) = (state.tuning.dragon.interval_min, state.tuning.dragon.interval_max);
    state.schedulers.dragon.rearm(&mut state.rng, min, max);

    if state.dragon.is_some() || !state.gate.is_open(state.clock) {
        return;
    }
    if !chance(&mut state.rng, state.tuning.dragon.chance) {
        return;
    }

    let dragon = Dragon::spawn(state);
    log::info!(
        "Dragon inbound (target x {:.0}, {} bolts)",
        dragon.target_x,
        dragon.burst_total
    );
    state.gate.record(state.clock, MajorEvent::Dragon);
    state.dragon = Some(dragon);
}

/// Uniform offset within `±amount` per axis
fn jitter(rng: &mut Pcg32, amount: Vec2) -> Vec2 {
    Vec2::new(rnd(rng, -amount.x, amount.x), rnd(rng, -amount.y, amount.y))
}

/// Emit one fire bolt aimed at the player with jitter
fn spit(state: &mut GameState, from: Vec2) {
    let t = &state.tuning.dragon;
    let (speed_min, speed_max, radius, life) =
        (t.fire_speed_min, t.fire_speed_max, t.fire_radius, t.fire_life);
    let aim_jitter = Vec2::new(t.aim_jitter_x, t.aim_jitter_y);
    let bolt_jitter = Vec2::new(t.bolt_jitter_x, t.bolt_jitter_y);
    let origin = from + Vec2::new(0.0, t.mouth_offset);
    let rng = &mut state.rng;

    let aim = state.player.pos + jitter(rng, aim_jitter);
    let dir = (aim - origin).try_normalize().unwrap_or(Vec2::Y);
    let speed = rnd(rng, speed_min, speed_max);
    let vel = dir * speed + jitter(rng, bolt_jitter);

    let id = state.next_entity_id();
    state.fires.push(Fire {
        id,
        pos: origin,
        vel,
        radius,
        life,
    });
}

/// Advance the dragon state machine
pub fn update_dragon(state: &mut GameState, dt: f32) {
    let Some(mut dragon) = state.dragon.take() else {
        return;
    };
    let t = state.tuning.dragon.clone();

    match dragon.state {
        DragonState::Approaching => {
            let dx = dragon.target_x - dragon.pos.x;
            dragon.pos.x += dx.signum() * dx.abs().min(dragon.speed * dt);
            dragon.pos.y += t.descend_speed * dt;
            let aligned = (dragon.target_x - dragon.pos.x).abs() < t.align_tolerance;
            if aligned && dragon.pos.y >= -10.0 {
                dragon.state = DragonState::Dropping;
            }
        }
        DragonState::Dropping => {
            dragon.pos.y += t.drop_speed * dt;
            if dragon.pos.y >= dragon.surface_y {
                dragon.pos.y = dragon.surface_y;
                dragon.state = DragonState::Spitting;
                dragon.burst_count = 0;
                dragon.burst_timer = t.first_bolt_delay;
            }
        }
        DragonState::Spitting => {
            // Drain the timer so burst density does not depend on frame rate
            dragon.burst_timer -= dt;
            while dragon.burst_timer <= 0.0 && dragon.burst_count < dragon.burst_total {
                spit(state, dragon.pos);
                dragon.burst_count += 1;
                dragon.burst_timer += dragon.burst_interval;
            }
            if dragon.burst_count >= dragon.burst_total {
                dragon.burst_timer = dragon.burst_timer.max(0.0);
                tick_down(&mut dragon.leave_delay, dt);
                if dragon.leave_delay <= 0.0 {
                    let side = if state.rng.random_bool(0.5) { -1.0 } else { 1.0 };
                    dragon.vel = Vec2::new(side * (dragon.speed + t.leave_boost), t.leave_lift);
                    dragon.state = DragonState::Leaving;
                }
            }
        }
        DragonState::Leaving => {
            dragon.pos += dragon.vel * dt;
            dragon.vel.y += t.leave_accel * dt;
            let m = t.exit_margin;
            let gone = dragon.pos.y < -m
                || dragon.pos.y > ARENA_H + m
                || dragon.pos.x < -m
                || dragon.pos.x > ARENA_W + m;
            if gone {
                log::debug!("Dragon left the arena");
                return;
            }
        }
    }

    state.dragon = Some(dragon);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Difficulty;
    use crate::sim::state::GamePhase;

    fn hard_round() -> GameState {
        let mut state = GameState::new(11, Difficulty::Hard);
        state.start_round();
        state
    }

    #[test]
    fn test_dragon_disabled_below_hard() {
        let mut state = GameState::new(11, Difficulty::Normal);
        state.start_round();
        state.tuning.dragon.chance = 1.0;
        for _ in 0..1000 {
            try_spawn_dragon(&mut state, 0.05);
        }
        assert!(state.dragon.is_none());
    }

    #[test]
    fn test_dragon_spawns_when_roll_passes() {
        let mut state = hard_round();
        state.tuning.dragon.chance = 1.0;
        let threshold = state.schedulers.dragon.threshold;
        try_spawn_dragon(&mut state, threshold + 0.01);
        let dragon = state.dragon.as_ref().expect("dragon spawned");
        assert_eq!(dragon.state, DragonState::Approaching);
        assert_eq!(state.gate.starts().len(), 1);
    }

    #[test]
    fn test_failed_roll_just_resets_timer() {
        let mut state = hard_round();
        state.tuning.dragon.chance = 0.0;
        let threshold = state.schedulers.dragon.threshold;
        try_spawn_dragon(&mut state, threshold + 0.01);
        assert!(state.dragon.is_none());
        assert_eq!(state.schedulers.dragon.elapsed, 0.0);
    }

    #[test]
    fn test_entry_and_landing_follow_tuning() {
        let mut state = hard_round();
        state.tuning.dragon.entry_offset_x = 300.0;
        state.tuning.dragon.entry_y = -50.0;
        state.tuning.dragon.landing_inset = 500.0;
        state.tuning.dragon.shadow_offset = 40.0;
        for _ in 0..50 {
            let dragon = Dragon::spawn(&mut state);
            assert!(dragon.pos.x == -300.0 || dragon.pos.x == ARENA_W + 300.0);
            assert_eq!(dragon.pos.y, -50.0);
            assert!(dragon.target_x >= 500.0 && dragon.target_x <= ARENA_W - 500.0);
            let shadow = dragon.shadow().expect("inbound dragon casts a shadow");
            assert_eq!(shadow.y, dragon.surface_y + 40.0);
        }
    }

    #[test]
    fn test_bolts_leave_from_mouth_without_jitter() {
        let mut state = hard_round();
        state.tuning.dragon.mouth_offset = 50.0;
        state.tuning.dragon.aim_jitter_x = 0.0;
        state.tuning.dragon.aim_jitter_y = 0.0;
        state.tuning.dragon.bolt_jitter_x = 0.0;
        state.tuning.dragon.bolt_jitter_y = 0.0;
        state.player.pos = Vec2::new(640.0, 600.0);
        state.fires.clear();

        spit(&mut state, Vec2::new(640.0, 100.0));
        let bolt = &state.fires[0];
        assert_eq!(bolt.pos, Vec2::new(640.0, 150.0));
        // Straight down at the player
        assert!(bolt.vel.x.abs() < 1e-3);
        assert!(bolt.vel.y > 0.0);
    }

    #[test]
    fn test_state_sequence_in_order() {
        let mut state = hard_round();
        state.dragon = Some(Dragon::spawn(&mut state));

        let mut seen = vec![DragonState::Approaching];
        let mut steps = 0;
        while let Some(dragon) = &state.dragon {
            if *seen.last().unwrap() != dragon.state {
                seen.push(dragon.state);
            }
            update_dragon(&mut state, 1.0 / 60.0);
            steps += 1;
            assert!(steps < 10_000, "dragon never left");
        }

        assert_eq!(
            seen,
            vec![
                DragonState::Approaching,
                DragonState::Dropping,
                DragonState::Spitting,
                DragonState::Leaving,
            ]
        );
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_burst_fires_full_count_with_large_steps() {
        let mut state = hard_round();
        let mut dragon = Dragon::spawn(&mut state);
        dragon.state = DragonState::Spitting;
        dragon.pos = Vec2::new(640.0, 150.0);
        dragon.burst_total = 12;
        dragon.burst_interval = 0.01;
        dragon.burst_timer = 0.0;
        state.dragon = Some(dragon);
        state.fires.clear();

        // One 50 ms step must emit several bolts at once
        update_dragon(&mut state, 0.05);
        assert!(state.fires.len() >= 5, "got {}", state.fires.len());

        update_dragon(&mut state, 0.05);
        update_dragon(&mut state, 0.05);
        assert_eq!(state.fires.len(), 12);
        let dragon = state.dragon.as_ref().expect("still perched or leaving");
        assert!(dragon.burst_timer >= 0.0);
    }
}
