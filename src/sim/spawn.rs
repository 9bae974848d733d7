//! Spawn schedulers for pickups, hazards and timed specials
//!
//! Every family owns an `Accumulator`: elapsed time piles up until a
//! (usually randomized) threshold is crossed, then one spawn attempt fires and
//! the accumulator resets. Attempts that lose their probability roll are
//! skipped silently and retried on the next crossing.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entities::{Hazard, Pickup, PickupKind, TimedItem};
use super::schedule::Deferred;
use super::state::{GameState, chance, rnd};
use crate::consts::{ARENA_H, ARENA_W};
use crate::tuning::{SpecialTuning, Tuning};

/// Elapsed-time accumulator with a threshold
#[derive(Debug, Clone)]
pub struct Accumulator {
    pub elapsed: f32,
    pub threshold: f32,
}

impl Accumulator {
    pub fn new(threshold: f32) -> Self {
        Self {
            elapsed: 0.0,
            threshold,
        }
    }

    /// Accumulator with a threshold drawn from [min, max)
    pub fn randomized(rng: &mut Pcg32, min: f32, max: f32) -> Self {
        Self::new(rnd(rng, min, max))
    }

    /// Add elapsed time; true (and reset) once the threshold is crossed
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed > self.threshold {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Pick a fresh threshold for the next cycle
    pub fn rearm(&mut self, rng: &mut Pcg32, min: f32, max: f32) {
        self.threshold = rnd(rng, min, max);
    }
}

/// One accumulator per spawn family
#[derive(Debug, Clone)]
pub struct Schedulers {
    pub pickups: Accumulator,
    pub hazards: Accumulator,
    pub food: Accumulator,
    pub clock: Accumulator,
    pub dragon: Accumulator,
    pub meteor: Accumulator,
    pub convoy: Accumulator,
    pub tornado: Accumulator,
}

impl Schedulers {
    pub fn new(t: &Tuning, rng: &mut Pcg32) -> Self {
        let p = &t.pickups;
        Self {
            pickups: Accumulator::randomized(rng, p.batch_interval_min, p.batch_interval_max),
            hazards: Accumulator::new(t.hazards.spawn_interval),
            food: Accumulator::randomized(rng, t.food.interval_min, t.food.interval_max),
            clock: Accumulator::randomized(rng, t.clock.interval_min, t.clock.interval_max),
            dragon: Accumulator::randomized(rng, t.dragon.interval_min, t.dragon.interval_max),
            meteor: Accumulator::randomized(rng, t.meteor.interval_min, t.meteor.interval_max),
            convoy: Accumulator::randomized(rng, t.convoy.interval_min, t.convoy.interval_max),
            tornado: Accumulator::new(t.tornado.check_interval),
        }
    }
}

/// Random point at least `inset` from every edge
fn random_point(rng: &mut Pcg32, inset: f32) -> Vec2 {
    Vec2::new(
        rnd(rng, inset, ARENA_W - inset),
        rnd(rng, inset, ARENA_H - inset),
    )
}

/// Opening population: gems plus hazards up to the floor
pub fn spawn_initial(state: &mut GameState) {
    for _ in 0..state.tuning.pickups.initial_gems {
        spawn_gem(state);
    }
    fill_hazards_to_floor(state);
}

/// Drop a single gem somewhere in the arena (respects the pool cap)
pub fn spawn_gem(state: &mut GameState) -> bool {
    spawn_pickup(state, PickupKind::Gem)
}

fn spawn_pickup(state: &mut GameState, kind: PickupKind) -> bool {
    let t = &state.tuning.pickups;
    if state.pickups.len() >= t.pool_cap {
        return false;
    }
    let (radius, value) = match kind {
        PickupKind::Gem => (t.gem_radius, t.gem_value),
        _ => (t.item_radius, 0),
    };
    let pos = random_point(&mut state.rng, 40.0);
    let id = state.next_entity_id();
    state.pickups.push(Pickup {
        id,
        kind,
        pos,
        radius,
        value,
    });
    log::debug!("Spawned {:?} #{}", kind, id);
    true
}

/// Weighted choice among the non-gem pool pickups
fn roll_extra_kind(state: &mut GameState) -> PickupKind {
    let w = &state.tuning.pickups.extra_weights;
    let table = [
        (PickupKind::Shrimp, w.shrimp.max(0.0)),
        (PickupKind::MilkTea, w.milktea.max(0.0)),
        (PickupKind::Sushi, w.sushi.max(0.0)),
        (PickupKind::Magnet, w.magnet.max(0.0)),
    ];
    let total: f32 = table.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return PickupKind::Shrimp;
    }
    let mut roll = state.rng.random::<f32>() * total;
    for (kind, weight) in table {
        if roll < weight {
            return kind;
        }
        roll -= weight;
    }
    PickupKind::Magnet
}

/// Periodic batch: a handful of gems plus maybe one special pickup
pub fn run_pickup_scheduler(state: &mut GameState, dt: f32) {
    if !state.schedulers.pickups.advance(dt) {
        return;
    }
    let (min, max) = (
        state.tuning.pickups.batch_interval_min,
        state.tuning.pickups.batch_interval_max,
    );
    state.schedulers.pickups.rearm(&mut state.rng, min, max);

    for _ in 0..state.tuning.pickups.batch_gems {
        spawn_gem(state);
    }
    if chance(&mut state.rng, state.tuning.pickups.extra_chance) {
        let kind = roll_extra_kind(state);
        spawn_pickup(state, kind);
    }
}

/// Build a hazard away from the player, or None if no spot was found
fn place_hazard(state: &mut GameState, max_speed: f32) -> Option<Hazard> {
    let t = &state.tuning.hazards;
    let (radius, safe, life_min, life_max) = (t.radius, t.safe_distance, t.life_min, t.life_max);
    let player = state.player.pos;

    let pos = (0..16)
        .map(|_| random_point(&mut state.rng, 60.0))
        .find(|p| p.distance(player) >= safe)?;
    let vel = Vec2::new(
        rnd(&mut state.rng, -max_speed, max_speed),
        rnd(&mut state.rng, -max_speed, max_speed),
    );
    let life = rnd(&mut state.rng, life_min, life_max);
    Some(Hazard {
        id: state.next_entity_id(),
        pos,
        vel,
        radius,
        life,
        despawning: false,
    })
}

/// Keep placing hazards until the floor is met (bounded retries, never past the cap)
pub fn fill_hazards_to_floor(state: &mut GameState) {
    let floor = state.tuning.hazards.floor.min(state.tuning.hazards.cap);
    let speed = state.tuning.hazards.initial_speed;
    let mut attempts = 0;
    while state.hazards.len() < floor && attempts < 64 {
        attempts += 1;
        if let Some(h) = place_hazard(state, speed) {
            state.hazards.push(h);
        }
    }
}

/// Mark one active hazard for a graceful exit: the shortest-lived or a random one
pub fn despawn_one(state: &mut GameState) -> bool {
    let active: Vec<usize> = state
        .hazards
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.despawning)
        .map(|(i, _)| i)
        .collect();
    if active.is_empty() {
        return false;
    }

    let victim = if state.rng.random_bool(0.5) {
        active
            .iter()
            .copied()
            .min_by(|&a, &b| state.hazards[a].life.total_cmp(&state.hazards[b].life))
            .unwrap_or(active[0])
    } else {
        active[state.rng.random_range(0..active.len())]
    };

    let (speed, life) = (
        state.tuning.hazards.despawn_speed,
        state.tuning.hazards.despawn_life,
    );
    let hazard = &mut state.hazards[victim];
    hazard.begin_despawn(speed, life);
    log::debug!("Hazard #{} despawning", hazard.id);
    true
}

/// Continuous hazard spawner: makes room at the cap, then adds if there is space
pub fn run_hazard_scheduler(state: &mut GameState, dt: f32) {
    if !state.schedulers.hazards.advance(dt) {
        return;
    }
    let cap = state.tuning.hazards.cap;
    let active = state.hazards.iter().filter(|h| !h.despawning).count();
    if active + 1 >= cap {
        despawn_one(state);
    }
    if state.hazards.len() < cap {
        let speed = state.tuning.hazards.spawn_speed;
        if let Some(h) = place_hazard(state, speed) {
            log::debug!("Hazard #{} spawned ({} live)", h.id, state.hazards.len() + 1);
            state.hazards.push(h);
        }
    }
}

fn roll_special(rng: &mut Pcg32, t: &SpecialTuning, kind: PickupKind) -> Option<TimedItem> {
    if !chance(rng, t.chance) {
        return None;
    }
    Some(TimedItem {
        kind,
        pos: random_point(rng, 70.0),
        radius: t.radius,
        life: rnd(rng, t.life_min, t.life_max),
    })
}

/// Food (heal) and clock (time bonus) singletons
pub fn run_specials_scheduler(state: &mut GameState, dt: f32) {
    if state.food.is_none() && state.schedulers.food.advance(dt) {
        let t = state.tuning.food.clone();
        state.schedulers.food.rearm(&mut state.rng, t.interval_min, t.interval_max);
        let kind = if state.rng.random_bool(0.5) {
            PickupKind::Sushi
        } else {
            PickupKind::Shrimp
        };
        state.food = roll_special(&mut state.rng, &t, kind);
        if state.food.is_some() {
            log::debug!("Food item spawned");
        }
    }

    if state.clock_item.is_none() && state.schedulers.clock.advance(dt) {
        let t = state.tuning.clock.clone();
        state.schedulers.clock.rearm(&mut state.rng, t.interval_min, t.interval_max);
        state.clock_item = roll_special(&mut state.rng, &t, PickupKind::Clock);
        if state.clock_item.is_some() {
            log::debug!("Clock item spawned");
        }
    }
}

/// Queue a replacement gem after a short random delay
pub fn schedule_gem_respawn(state: &mut GameState) {
    let (min, max) = (
        state.tuning.pickups.respawn_delay_min,
        state.tuning.pickups.respawn_delay_max,
    );
    let at = state.clock + rnd(&mut state.rng, min, max);
    state.queue.push(at, Deferred::Gem);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Difficulty;

    fn playing() -> GameState {
        let mut state = GameState::new(42, Difficulty::Normal);
        state.start_round();
        state
    }

    #[test]
    fn test_accumulator_fires_and_resets() {
        let mut acc = Accumulator::new(1.0);
        assert!(!acc.advance(0.6));
        assert!(acc.advance(0.6));
        assert_eq!(acc.elapsed, 0.0);
        assert!(!acc.advance(0.6));
    }

    #[test]
    fn test_initial_hazards_keep_safe_distance() {
        let state = playing();
        for h in &state.hazards {
            assert!(h.pos.distance(state.player.pos) >= state.tuning.hazards.safe_distance);
        }
    }

    #[test]
    fn test_hazard_spawner_despawns_at_cap() {
        let mut state = playing();
        let cap = state.tuning.hazards.cap;
        while state.hazards.len() < cap {
            let h = place_hazard(&mut state, 0.0).expect("room for a hazard");
            state.hazards.push(h);
        }

        let interval = state.tuning.hazards.spawn_interval;
        run_hazard_scheduler(&mut state, interval + 0.01);

        assert_eq!(state.hazards.len(), cap, "cap must hold");
        assert_eq!(state.hazards.iter().filter(|h| h.despawning).count(), 1);
    }

    #[test]
    fn test_hazard_spawner_adds_while_making_room() {
        let mut state = playing();
        let cap = state.tuning.hazards.cap;
        state.hazards.clear();
        while state.hazards.len() < cap - 1 {
            let h = place_hazard(&mut state, 0.0).expect("room for a hazard");
            state.hazards.push(h);
        }

        let interval = state.tuning.hazards.spawn_interval;
        run_hazard_scheduler(&mut state, interval + 0.01);

        assert_eq!(state.hazards.len(), cap);
        assert_eq!(state.hazards.iter().filter(|h| h.despawning).count(), 1);
    }

    #[test]
    fn test_specials_are_singletons() {
        let mut state = playing();
        state.tuning.food.chance = 1.0;
        state.tuning.clock.chance = 1.0;
        for _ in 0..2000 {
            run_specials_scheduler(&mut state, 0.05);
        }
        assert!(state.food.is_some());
        assert!(state.clock_item.is_some());
        assert_eq!(state.clock_item.as_ref().map(|c| c.kind), Some(PickupKind::Clock));
    }

    #[test]
    fn test_failed_roll_skips_quietly() {
        let mut state = playing();
        state.tuning.food.chance = 0.0;
        for _ in 0..2000 {
            run_specials_scheduler(&mut state, 0.05);
        }
        assert!(state.food.is_none());
    }

    #[test]
    fn test_pickup_pool_cap() {
        let mut state = playing();
        state.tuning.pickups.pool_cap = 6;
        for _ in 0..20 {
            spawn_gem(&mut state);
        }
        assert_eq!(state.pickups.len(), 6);
    }
}
