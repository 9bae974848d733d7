//! Simulation step
//!
//! Advances the world by one (capped) frame: timers, schedulers, set-piece
//! events, movement, contacts and finally reaping of finished entities.

use glam::Vec2;

use super::collision::resolve_contacts;
use super::dragon::{try_spawn_dragon, update_dragon};
use super::schedule::run_deferred;
use super::sequencer::{advance_warnings, try_schedule_convoy, try_schedule_meteor};
use super::spawn::{
    fill_hazards_to_floor, run_hazard_scheduler, run_pickup_scheduler, run_specials_scheduler,
};
use super::state::{GameOverReason, GamePhase, GameState};
use super::tornado::{try_spawn_tornado, update_tornado};
use crate::consts::MAX_FRAME_DT;
use crate::tick_down;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Held-direction intent (normalized by the player, any length accepted)
    pub move_intent: Vec2,
    /// Dash destination in arena coordinates (one-shot)
    pub dash_target: Option<Vec2>,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the game state by `dt` seconds (capped at `MAX_FRAME_DT`)
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if input.pause {
        if state.phase == GamePhase::Paused {
            state.resume();
        } else if state.pause() {
            return;
        }
    }

    let dt = if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    };

    match state.phase {
        GamePhase::Playing => step_playing(state, input, dt),
        GamePhase::Dying => step_dying(state, dt),
        GamePhase::Menu | GamePhase::Paused | GamePhase::GameOver => {}
    }
}

/// Death fall: only the body, particles and shake move
fn step_dying(state: &mut GameState, dt: f32) {
    state.shake.decay(dt);
    state.update_particles(dt);
    let gravity = state.tuning.player.death_gravity;
    state.player.fall(dt, gravity);
    if state.player.fallen_out(state.tuning.player.death_margin) {
        state.end_round(GameOverReason::Died);
    }
}

fn step_playing(state: &mut GameState, input: &TickInput, dt: f32) {
    state.clock += dt;
    state.player.tick_timers(dt);
    tick_down(&mut state.tornado_cooldown, dt);
    state.shake.decay(dt);
    state.update_particles(dt);

    tick_down(&mut state.time_left, dt);
    if state.time_left <= 0.0 {
        state.end_round(GameOverReason::TimeUp);
        return;
    }

    // Spawn schedulers
    run_pickup_scheduler(state, dt);
    run_hazard_scheduler(state, dt);
    run_specials_scheduler(state, dt);
    try_spawn_dragon(state, dt);
    try_schedule_meteor(state, dt);
    try_schedule_convoy(state, dt);
    try_spawn_tornado(state, dt);

    // Set pieces
    update_dragon(state, dt);
    advance_warnings(state, dt);
    run_deferred(state);
    update_tornado(state, dt);

    // Player
    state.player.steer(input.move_intent, dt);
    if let Some(target) = input.dash_target {
        if state.player.try_dash(target, &state.tuning.player) {
            let p = &state.tuning.player;
            state.shake.bump(p.dash_shake_secs, p.dash_shake_strength);
        }
    }

    advance_entities(state, dt);
    resolve_contacts(state);
    reap(state);

    // Hazards lost to the tornado, explosions or despawns are replaced at once
    if state.phase == GamePhase::Playing {
        fill_hazards_to_floor(state);
    }
}

fn advance_entities(state: &mut GameState, dt: f32) {
    for h in state.hazards.iter_mut() {
        h.advance(dt);
    }
    let drag = state.tuning.dragon.fire_drag;
    for f in state.fires.iter_mut() {
        f.advance(dt, drag);
    }
    for m in state.comets.iter_mut().chain(state.vehicles.iter_mut()) {
        m.advance(dt);
    }
    if let Some(food) = state.food.as_mut() {
        tick_down(&mut food.life, dt);
    }
    if let Some(clock) = state.clock_item.as_mut() {
        tick_down(&mut clock.life, dt);
    }
}

/// Drop everything that expired or left the arena
fn reap(state: &mut GameState) {
    let margin = state.tuning.hazards.offscreen_margin;
    state.hazards.retain(|h| !h.is_gone(margin));
    state.fires.retain(|f| f.life > 0.0);
    state.comets.retain(|m| !m.is_gone());
    state.vehicles.retain(|m| !m.is_gone());
    if state.food.as_ref().is_some_and(|f| f.life <= 0.0) {
        state.food = None;
    }
    if state.clock_item.as_ref().is_some_and(|c| c.life <= 0.0) {
        state.clock_item = None;
    }
}
