//! Player contact resolution
//!
//! Every pool is tested against the player with a circular footprint of
//! `entity.radius + player.reach() - inset`. Beneficial contacts apply their
//! effect and disappear; damaging contacts go through `strike`, which is the
//! single gate for health loss, knockback and the invulnerability window.

use glam::Vec2;

use super::entities::{Body, ParticleStyle, Pickup, PickupKind};
use super::player::Player;
use super::spawn;
use super::state::{GamePhase, GameState, rnd};
use crate::tuning::{HitProfile, HitTuning};

/// Whether `body` overlaps the player, with the contact radius shrunk by `inset`
#[inline]
pub fn touches<B: Body>(player: &Player, body: &B, inset: f32) -> bool {
    body.pos().distance(player.pos) < body.radius() + player.reach() - inset
}

/// Unit vector from `from` to the player (defaults to +x when they coincide)
#[inline]
pub fn contact_normal(player: Vec2, from: Vec2) -> Vec2 {
    (player - from).try_normalize().unwrap_or(Vec2::X)
}

/// Anything that can hurt the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Dynamite,
    Fire,
    Comet,
    Vehicle,
}

impl DamageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DamageSource::Dynamite => "dynamite",
            DamageSource::Fire => "fire",
            DamageSource::Comet => "comet",
            DamageSource::Vehicle => "vehicle",
        }
    }

    pub fn profile(self, hits: &HitTuning) -> HitProfile {
        match self {
            DamageSource::Dynamite => hits.dynamite,
            DamageSource::Fire => hits.fire,
            DamageSource::Comet => hits.comet,
            DamageSource::Vehicle => hits.vehicle,
        }
    }
}

/// Apply one hit from an entity at `from`.
///
/// Returns false (and changes nothing) outside active play or while the
/// player is invulnerable. Health crossing to zero starts the death fall.
pub fn strike(state: &mut GameState, source: DamageSource, from: Vec2) -> bool {
    if state.phase != GamePhase::Playing || state.player.is_invulnerable() {
        return false;
    }

    let hit = source.profile(&state.tuning.hits);
    let normal = contact_normal(state.player.pos, from);
    let player = &mut state.player;
    player.set_health(player.health - hit.damage);
    player.knock_back(normal, hit.knockback);
    player.invuln = state.tuning.player.invuln_window;
    state.shake.bump(hit.shake_secs, hit.shake_strength);
    log::debug!(
        "Hit by {} (-{}), health {}",
        source.as_str(),
        hit.damage,
        state.player.health
    );

    if state.player.health <= 0.0 {
        state.begin_death(normal);
    }
    true
}

/// Credit a collected gem and queue its replacement
fn collect_gem(state: &mut GameState, gem: &Pickup) {
    state.score += u64::from(gem.value) * state.tuning.pickups.gem_score;
    state.gems += gem.value;
    spawn::schedule_gem_respawn(state);
}

/// Pull every gem still in the pool to the player at once
fn magnet_sweep(state: &mut GameState) {
    let (gems, rest): (Vec<Pickup>, Vec<Pickup>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|p| p.kind == PickupKind::Gem);
    state.pickups = rest;

    let target = state.player.pos;
    for gem in &gems {
        collect_gem(state, gem);
        state.spawn_trail(gem.pos, target, 5);
    }
    log::debug!("Magnet collected {} gems", gems.len());
}

/// Apply a beneficial pickup effect
fn apply_pickup(state: &mut GameState, kind: PickupKind) {
    let t = &state.tuning.pickups;
    match kind {
        // Gems are credited by the caller, which knows the value
        PickupKind::Gem => {}
        PickupKind::Shrimp => {
            let heal = t.shrimp_heal;
            state.player.heal(heal);
        }
        PickupKind::Sushi => {
            let heal = t.sushi_heal;
            state.player.heal(heal);
        }
        PickupKind::MilkTea => {
            let (mult, secs) = (
                state.tuning.player.speed_buff_mult,
                state.tuning.player.speed_buff_secs,
            );
            state.player.apply_speed_buff(mult, secs);
        }
        PickupKind::Magnet => magnet_sweep(state),
        PickupKind::Clock => {
            let (min, max) = (t.clock_bonus_min, t.clock_bonus_max);
            let bonus = rnd(&mut state.rng, min, max);
            state.time_left = (state.time_left + bonus).min(state.tuning.max_time_left);
            log::debug!("Clock bonus +{:.1}s", bonus);
        }
    }
}

fn resolve_pickups(state: &mut GameState) {
    let inset = state.tuning.player.pickup_inset;
    let (taken, kept): (Vec<Pickup>, Vec<Pickup>) = std::mem::take(&mut state.pickups)
        .into_iter()
        .partition(|p| touches(&state.player, p, inset));
    state.pickups = kept;

    for pickup in taken {
        if pickup.kind == PickupKind::Gem {
            collect_gem(state, &pickup);
        }
        state.spawn_burst(pickup.pos, 6, ParticleStyle::Spark);
        apply_pickup(state, pickup.kind);
    }
}

fn resolve_specials(state: &mut GameState) {
    let inset = state.tuning.player.pickup_inset;
    if let Some(food) = state.food.take_if(|f| touches(&state.player, &*f, inset)) {
        state.spawn_burst(food.pos, 6, ParticleStyle::Spark);
        apply_pickup(state, food.kind);
    }
    if let Some(clock) = state.clock_item.take_if(|c| touches(&state.player, &*c, inset)) {
        state.spawn_burst(clock.pos, 6, ParticleStyle::Spark);
        apply_pickup(state, clock.kind);
    }
}

/// Dynamite: the first overlapping stick explodes if the hit lands
fn resolve_hazards(state: &mut GameState) {
    let inset = state.tuning.player.hazard_inset;
    let Some(idx) = state
        .hazards
        .iter()
        .position(|h| touches(&state.player, h, inset))
    else {
        return;
    };

    let pos = state.hazards[idx].pos;
    if strike(state, DamageSource::Dynamite, pos) {
        state.hazards.remove(idx);
        state.spawn_burst(pos, 12, ParticleStyle::Boom);
    }
}

/// Fires, comets and vehicles are spent on contact even when the hit is blocked
fn resolve_projectiles(state: &mut GameState) {
    let inset = state.tuning.player.hazard_inset;

    let (hit, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.fires)
        .into_iter()
        .partition(|f| touches(&state.player, f, inset));
    state.fires = kept;
    for fire in hit {
        strike(state, DamageSource::Fire, fire.pos);
        state.spawn_burst(fire.pos, 4, ParticleStyle::Flame);
    }

    let (hit, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.comets)
        .into_iter()
        .partition(|c| touches(&state.player, c, inset));
    state.comets = kept;
    for comet in hit {
        strike(state, DamageSource::Comet, comet.pos);
        state.spawn_burst(comet.pos, 8, ParticleStyle::Boom);
    }

    let (hit, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.vehicles)
        .into_iter()
        .partition(|v| touches(&state.player, v, inset));
    state.vehicles = kept;
    for vehicle in hit {
        strike(state, DamageSource::Vehicle, vehicle.pos);
        state.spawn_burst(vehicle.pos, 8, ParticleStyle::Boom);
    }
}

/// Resolve every player contact for this tick
pub fn resolve_contacts(state: &mut GameState) {
    if state.phase != GamePhase::Playing {
        return;
    }
    resolve_pickups(state);
    resolve_specials(state);
    resolve_hazards(state);
    resolve_projectiles(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Difficulty;
    use crate::sim::entities::{Fire, Hazard, TimedItem};

    /// A round with nothing in the arena but the player
    fn empty_round() -> GameState {
        let mut state = GameState::new(9, Difficulty::Normal);
        state.start_round();
        state.pickups.clear();
        state.hazards.clear();
        state
    }

    fn add_gem(state: &mut GameState, pos: Vec2) {
        let id = state.next_entity_id();
        let (radius, value) = (state.tuning.pickups.gem_radius, state.tuning.pickups.gem_value);
        state.pickups.push(Pickup {
            id,
            kind: PickupKind::Gem,
            pos,
            radius,
            value,
        });
    }

    fn add_hazard(state: &mut GameState, pos: Vec2) {
        let id = state.next_entity_id();
        state.hazards.push(Hazard {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: 16.0,
            life: 20.0,
            despawning: false,
        });
    }

    #[test]
    fn test_gem_pickup_credits_value() {
        let mut state = empty_round();
        let center = state.player.pos;
        add_gem(&mut state, center + Vec2::new(5.0, 0.0));

        resolve_contacts(&mut state);
        assert!(state.pickups.is_empty());
        assert_eq!(state.gems, 1);
        assert_eq!(state.score, state.tuning.pickups.gem_score);
        // Replacement queued
        assert_eq!(state.queue.len(), 1);
    }

    #[test]
    fn test_dynamite_hit() {
        let mut state = empty_round();
        let start = state.player.pos;
        add_hazard(&mut state, start + Vec2::new(-20.0, 0.0));
        let health = state.player.health;
        let hit = state.tuning.hits.dynamite;

        resolve_contacts(&mut state);
        assert_eq!(state.player.health, health - hit.damage);
        assert_eq!(state.player.invuln, state.tuning.player.invuln_window);
        assert!(state.hazards.is_empty());
        assert!((state.player.pos - (start + Vec2::X * hit.knockback)).length() < 1e-3);
    }

    #[test]
    fn test_invulnerability_blocks_stacked_hits() {
        let mut state = empty_round();
        let center = state.player.pos;
        for offset in [Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(0.0, 10.0)] {
            add_hazard(&mut state, center + offset);
        }
        let health = state.player.health;

        for _ in 0..5 {
            resolve_contacts(&mut state);
        }
        assert_eq!(state.player.health, health - state.tuning.hits.dynamite.damage);
        assert_eq!(state.hazards.len(), 2, "blocked hazards stay in play");
    }

    #[test]
    fn test_death_starts_once() {
        let mut state = empty_round();
        state.player.set_health(1.0);
        let from = state.player.pos - Vec2::new(10.0, 0.0);

        assert!(strike(&mut state, DamageSource::Dynamite, from));
        assert_eq!(state.player.health, 0.0);
        assert_eq!(state.phase, GamePhase::Dying);

        state.player.invuln = 0.0;
        let carry = state.player.carry;
        assert!(!strike(&mut state, DamageSource::Vehicle, from));
        assert_eq!(state.player.carry, carry);
        assert_eq!(state.player.health, 0.0);
    }

    #[test]
    fn test_degenerate_normal_defaults_to_x() {
        assert_eq!(contact_normal(Vec2::ONE, Vec2::ONE), Vec2::X);
    }

    #[test]
    fn test_magnet_collects_every_gem_once() {
        let mut state = empty_round();
        for i in 0..6 {
            add_gem(&mut state, Vec2::new(100.0 + i as f32 * 150.0, 80.0));
        }
        let center = state.player.pos;
        let id = state.next_entity_id();
        state.pickups.push(Pickup {
            id,
            kind: PickupKind::Magnet,
            pos: center,
            radius: 14.0,
            value: 0,
        });

        resolve_contacts(&mut state);
        assert!(state.pickups.is_empty());
        assert_eq!(state.gems, 6);
        assert_eq!(state.score, 6 * state.tuning.pickups.gem_score);

        resolve_contacts(&mut state);
        assert_eq!(state.gems, 6);
    }

    #[test]
    fn test_projectile_spent_while_invulnerable() {
        let mut state = empty_round();
        state.player.invuln = 0.5;
        let pos = state.player.pos;
        let id = state.next_entity_id();
        state.fires.push(Fire {
            id,
            pos,
            vel: Vec2::ZERO,
            radius: 14.0,
            life: 2.0,
        });
        let health = state.player.health;

        resolve_contacts(&mut state);
        assert!(state.fires.is_empty());
        assert_eq!(state.player.health, health);
    }

    #[test]
    fn test_specials_heal_and_add_time() {
        let mut state = empty_round();
        state.player.set_health(2.0);
        let pos = state.player.pos;
        state.food = Some(TimedItem {
            kind: PickupKind::Sushi,
            pos,
            radius: 16.0,
            life: 10.0,
        });
        state.clock_item = Some(TimedItem {
            kind: PickupKind::Clock,
            pos,
            radius: 16.0,
            life: 10.0,
        });
        let time = state.time_left;

        resolve_contacts(&mut state);
        assert!(state.food.is_none() && state.clock_item.is_none());
        assert_eq!(state.player.health, 2.0 + state.tuning.pickups.sushi_heal);
        assert!(state.time_left >= time + state.tuning.pickups.clock_bonus_min);
    }

    #[test]
    fn test_clock_bonus_capped() {
        let mut state = empty_round();
        let cap = state.tuning.max_time_left;
        state.time_left = cap - 1.0;
        let pos = state.player.pos;
        state.clock_item = Some(TimedItem {
            kind: PickupKind::Clock,
            pos,
            radius: 16.0,
            life: 10.0,
        });

        resolve_contacts(&mut state);
        assert!(state.clock_item.is_none());
        assert_eq!(state.time_left, cap);
    }
}
