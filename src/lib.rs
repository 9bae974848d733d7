//! Emoji Survival - a top-down arcade dodger
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity pools, spawners, set-piece events, collisions)
//! - `game`: Frame driver and round controls
//! - `settings`: Player-facing preferences and difficulty selection
//! - `tuning`: Data-driven game balance

pub mod game;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use game::{Game, Renderer};
pub use settings::{Difficulty, Settings};
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Internal arena resolution (presentation scales this to the display)
    pub const ARENA_W: f32 = 1280.0;
    pub const ARENA_H: f32 = 720.0;

    /// Largest step the frame driver hands to the simulation (stall protection)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Maximum particles
    pub const MAX_PARTICLES: usize = 256;
}

/// Decrement a countdown, flooring at zero
#[inline]
pub fn tick_down(timer: &mut f32, dt: f32) {
    *timer = (*timer - dt).max(0.0);
}

/// Center of the arena
#[inline]
pub fn arena_center() -> Vec2 {
    Vec2::new(consts::ARENA_W / 2.0, consts::ARENA_H / 2.0)
}

/// Clamp a position so a body with the given half extents stays inside the arena
#[inline]
pub fn clamp_to_arena(pos: Vec2, half: Vec2) -> Vec2 {
    pos.clamp(
        half,
        Vec2::new(consts::ARENA_W - half.x, consts::ARENA_H - half.y),
    )
}

/// True once `pos` is further than `margin` outside the arena on any side
#[inline]
pub fn outside_arena(pos: Vec2, margin: f32) -> bool {
    pos.x < -margin
        || pos.y < -margin
        || pos.x > consts::ARENA_W + margin
        || pos.y > consts::ARENA_H + margin
}

/// Unit vector pointing at the arena edge closest to `pos`
pub fn nearest_edge_dir(pos: Vec2) -> Vec2 {
    let left = pos.x;
    let right = consts::ARENA_W - pos.x;
    let top = pos.y;
    let bottom = consts::ARENA_H - pos.y;

    let nearest = left.min(right).min(top).min(bottom);
    if nearest == left {
        Vec2::NEG_X
    } else if nearest == right {
        Vec2::X
    } else if nearest == top {
        Vec2::NEG_Y
    } else {
        Vec2::Y
    }
}
