//! The player actor: movement, dash, health, speed buff and the death fall

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::ARENA_H;
use crate::tuning::PlayerTuning;
use crate::{arena_center, clamp_to_arena, tick_down};

/// Player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    /// Full width/height of the body
    pub size: Vec2,
    pub base_speed: f32,
    /// Speed after buffs
    pub speed: f32,
    pub health: f32,
    pub max_health: f32,
    /// Remaining invulnerability (seconds)
    pub invuln: f32,
    pub buff_left: f32,
    pub buff_mult: f32,
    /// Remaining dash cooldown (seconds)
    pub dash_cooldown: f32,
    /// Velocity carried through the death fall
    pub carry: Vec2,
}

impl Player {
    /// Fresh player at arena center
    pub fn new(tuning: &PlayerTuning) -> Self {
        let mut player = Self {
            pos: arena_center(),
            size: Vec2::new(tuning.width, tuning.height),
            base_speed: tuning.base_speed,
            speed: tuning.base_speed,
            health: 0.0,
            max_health: tuning.max_health,
            invuln: 0.0,
            buff_left: 0.0,
            buff_mult: 1.0,
            dash_cooldown: 0.0,
            carry: Vec2::ZERO,
        };
        player.set_health(tuning.start_health);
        player
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.size / 2.0
    }

    /// Half of the larger body dimension, used for circular contact tests
    #[inline]
    pub fn reach(&self) -> f32 {
        self.size.max_element() / 2.0
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invuln > 0.0
    }

    #[inline]
    pub fn buff_active(&self) -> bool {
        self.buff_left > 0.0
    }

    /// Set health clamped to [0, max] at half-point granularity
    pub fn set_health(&mut self, value: f32) {
        let halves = (value * 2.0).round() / 2.0;
        self.health = halves.clamp(0.0, self.max_health);
    }

    pub fn heal(&mut self, amount: f32) {
        self.set_health(self.health + amount);
    }

    /// Count down invulnerability, buff and dash cooldown
    pub fn tick_timers(&mut self, dt: f32) {
        tick_down(&mut self.invuln, dt);
        tick_down(&mut self.dash_cooldown, dt);
        if self.buff_left > 0.0 {
            tick_down(&mut self.buff_left, dt);
            if self.buff_left == 0.0 {
                self.buff_mult = 1.0;
            }
        }
        self.refresh_speed();
    }

    fn refresh_speed(&mut self) {
        self.speed = if self.buff_active() {
            self.base_speed * self.buff_mult
        } else {
            self.base_speed
        };
    }

    /// Start (or refresh) the speed buff; repeated pickups reset the timer
    pub fn apply_speed_buff(&mut self, mult: f32, secs: f32) {
        self.buff_mult = mult;
        self.buff_left = secs;
        self.refresh_speed();
    }

    /// Move along the held-direction intent
    pub fn steer(&mut self, intent: Vec2, dt: f32) {
        let dir = intent.normalize_or_zero();
        self.pos = clamp_to_arena(self.pos + dir * self.speed * dt, self.half_extents());
    }

    /// Short dash toward `target`; returns true if it happened.
    ///
    /// Any request made off cooldown starts the cooldown, even one that is
    /// too short to move the player.
    pub fn try_dash(&mut self, target: Vec2, tuning: &PlayerTuning) -> bool {
        if self.dash_cooldown > 0.0 {
            return false;
        }
        self.dash_cooldown = tuning.dash_cooldown;

        let delta = target - self.pos;
        let dist = delta.length();
        if !dist.is_finite() || dist < tuning.dash_min {
            return false;
        }

        let step = dist.min(tuning.dash_max);
        self.pos = clamp_to_arena(self.pos + delta / dist * step, self.half_extents());
        true
    }

    /// Shove the player along `normal`
    pub fn knock_back(&mut self, normal: Vec2, magnitude: f32) {
        self.pos = clamp_to_arena(self.pos + normal * magnitude, self.half_extents());
    }

    /// Enter the ballistic death fall
    pub fn start_fall(&mut self, normal: Vec2, tuning: &PlayerTuning) {
        self.carry = Vec2::new(normal.x * tuning.death_carry, tuning.death_jump);
        self.invuln = 0.0;
    }

    /// Advance the death fall (ignores arena bounds)
    pub fn fall(&mut self, dt: f32, gravity: f32) {
        self.carry.y += gravity * dt;
        self.pos += self.carry * dt;
    }

    /// True once the body has dropped `margin` below the arena floor
    pub fn fallen_out(&self, margin: f32) -> bool {
        self.pos.y - self.size.y / 2.0 > ARENA_H + margin
    }
}
