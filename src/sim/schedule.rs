//! Deferred spawn queue
//!
//! Staggered bursts and delayed respawns are explicit entries ordered by
//! simulation time. The queue only drains inside a playing step, so pausing
//! freezes it and ending or restarting a round clears it.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entities::{Missile, MissileKind};
use super::spawn;
use super::state::{GamePhase, GameState, rnd};
use crate::consts::{ARENA_H, ARENA_W};

/// Work that fires at a future simulation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deferred {
    /// Replacement gem after a pickup
    Gem,
    /// One object of a meteor shower
    Comet,
    /// One object of a vehicle convoy
    Vehicle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    at: f32,
    what: Deferred,
}

/// Time-ordered queue (FIFO among equal times)
#[derive(Debug, Clone, Default)]
pub struct SpawnQueue {
    entries: VecDeque<Entry>,
}

impl SpawnQueue {
    pub fn push(&mut self, at: f32, what: Deferred) {
        let idx = self.entries.partition_point(|e| e.at <= at);
        self.entries.insert(idx, Entry { at, what });
    }

    /// Pop the earliest entry if it is due
    pub fn pop_due(&mut self, now: f32) -> Option<Deferred> {
        match self.entries.front() {
            Some(e) if e.at <= now => self.entries.pop_front().map(|e| e.what),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many pending entries of a kind
    pub fn count(&self, what: Deferred) -> usize {
        self.entries.iter().filter(|e| e.what == what).count()
    }
}

/// Execute everything that is due; stale entries no-op outside a playing round
pub fn run_deferred(state: &mut GameState) {
    while let Some(what) = state.queue.pop_due(state.clock) {
        if state.phase != GamePhase::Playing {
            continue;
        }
        match what {
            Deferred::Gem => {
                spawn::spawn_gem(state);
            }
            Deferred::Comet => spawn_comet(state),
            Deferred::Vehicle => spawn_vehicle(state),
        }
    }
}

/// Comet from above the arena, aimed loosely at the player
pub fn spawn_comet(state: &mut GameState) {
    let t = &state.tuning.meteor;
    let (speed_min, speed_max, radius, life, gravity) =
        (t.speed_min, t.speed_max, t.radius, t.life, t.gravity);
    let (entry, jx, jy) = (t.entry_offset, t.aim_jitter_x, t.aim_jitter_y);
    let rng = &mut state.rng;

    let pos = Vec2::new(rnd(rng, 0.0, ARENA_W), -entry);
    let aim = state.player.pos + Vec2::new(rnd(rng, -jx, jx), rnd(rng, -jy, jy));
    let dir = (aim - pos).try_normalize().unwrap_or(Vec2::Y);
    let vel = dir * rnd(rng, speed_min, speed_max);

    let id = state.next_entity_id();
    state.comets.push(Missile {
        id,
        kind: MissileKind::Comet,
        pos,
        vel,
        radius,
        life,
        gravity,
    });
}

/// Vehicle entering from the left or right edge on a random lane
pub fn spawn_vehicle(state: &mut GameState) {
    let t = &state.tuning.convoy;
    let (speed_min, speed_max, radius, life) = (t.speed_min, t.speed_max, t.radius, t.life);
    let (entry, inset) = (t.entry_offset, t.lane_inset);
    let rng = &mut state.rng;

    let from_left = rng.random_bool(0.5);
    let lane = rnd(rng, inset, ARENA_H - inset);
    let speed = rnd(rng, speed_min, speed_max);
    let (x, vx) = if from_left {
        (-entry, speed)
    } else {
        (ARENA_W + entry, -speed)
    };

    let id = state.next_entity_id();
    state.vehicles.push(Missile {
        id,
        kind: MissileKind::Vehicle,
        pos: Vec2::new(x, lane),
        vel: Vec2::new(vx, 0.0),
        radius,
        life,
        gravity: 0.0,
    });
}
