//! Pooled entity types and their per-tick kinematics

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{ARENA_H, ARENA_W};
use crate::{nearest_edge_dir, outside_arena, tick_down};

/// Anything with a position and a round footprint
pub trait Body {
    fn pos(&self) -> Vec2;
    fn radius(&self) -> f32;
}

macro_rules! impl_body {
    ($($ty:ty),*) => {
        $(impl Body for $ty {
            #[inline]
            fn pos(&self) -> Vec2 {
                self.pos
            }
            #[inline]
            fn radius(&self) -> f32 {
                self.radius
            }
        })*
    };
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Gem,
    Shrimp,
    MilkTea,
    Sushi,
    Magnet,
    Clock,
}

impl PickupKind {
    /// Emoji identifier handed to presentation
    pub fn glyph(self) -> &'static str {
        match self {
            PickupKind::Gem => "💎",
            PickupKind::Shrimp => "🦐",
            PickupKind::MilkTea => "🧋",
            PickupKind::Sushi => "🍣",
            PickupKind::Magnet => "🧲",
            PickupKind::Clock => "⏰",
        }
    }
}

/// A collectible lying in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub radius: f32,
    /// Currency value (gems only, 0 otherwise)
    pub value: u32,
}

/// A bouncing dynamite stick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub life: f32,
    /// Heading for the nearest edge; no longer bounces
    pub despawning: bool,
}

impl Hazard {
    /// Move, then reflect off the arena walls unless despawning
    pub fn advance(&mut self, dt: f32) {
        tick_down(&mut self.life, dt);
        self.pos += self.vel * dt;
        if self.despawning {
            return;
        }

        let r = self.radius;
        if self.pos.x < r {
            self.pos.x = r;
            self.vel.x = self.vel.x.abs();
        } else if self.pos.x > ARENA_W - r {
            self.pos.x = ARENA_W - r;
            self.vel.x = -self.vel.x.abs();
        }
        if self.pos.y < r {
            self.pos.y = r;
            self.vel.y = self.vel.y.abs();
        } else if self.pos.y > ARENA_H - r {
            self.pos.y = ARENA_H - r;
            self.vel.y = -self.vel.y.abs();
        }
    }

    /// Redirect toward the closest edge with a shortened life
    pub fn begin_despawn(&mut self, speed: f32, life: f32) {
        self.vel = nearest_edge_dir(self.pos) * speed;
        self.life = self.life.min(life);
        self.despawning = true;
    }

    /// Expired, or a despawning hazard that has left the extended bounds
    pub fn is_gone(&self, margin: f32) -> bool {
        self.life <= 0.0 || (self.despawning && outside_arena(self.pos, margin))
    }
}

/// A dragon fire bolt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fire {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub life: f32,
}

impl Fire {
    /// Move and apply the per-tick velocity decay
    pub fn advance(&mut self, dt: f32, drag: f32) {
        tick_down(&mut self.life, dt);
        self.pos += self.vel * dt;
        self.vel *= drag;
    }
}

/// Strike objects of a warning-then-strike event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissileKind {
    Comet,
    Vehicle,
}

impl MissileKind {
    pub fn glyph(self) -> &'static str {
        match self {
            MissileKind::Comet => "☄️",
            MissileKind::Vehicle => "🚗",
        }
    }
}

/// A ballistic (comet) or horizontal (vehicle) mover
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Missile {
    pub id: u32,
    pub kind: MissileKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub life: f32,
    /// Constant downward acceleration (0 for vehicles)
    pub gravity: f32,
}

/// How far beyond the arena a missile may travel before it is reaped
pub const MISSILE_MARGIN: f32 = 120.0;

impl Missile {
    pub fn advance(&mut self, dt: f32) {
        tick_down(&mut self.life, dt);
        self.vel.y += self.gravity * dt;
        self.pos += self.vel * dt;
    }

    pub fn is_gone(&self) -> bool {
        self.life <= 0.0 || outside_arena(self.pos, MISSILE_MARGIN)
    }
}

/// A singleton timed item (food heal or clock bonus)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedItem {
    pub kind: PickupKind,
    pub pos: Vec2,
    pub radius: f32,
    pub life: f32,
}

impl_body!(Pickup, Hazard, Fire, Missile, TimedItem);

/// Particle look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleStyle {
    Boom,
    Spark,
    Flame,
    Sparkle,
    Swirl,
}

impl ParticleStyle {
    pub fn glyph(self) -> &'static str {
        match self {
            ParticleStyle::Boom => "💥",
            ParticleStyle::Spark => "✨",
            ParticleStyle::Flame => "🔥",
            ParticleStyle::Sparkle => "💫",
            ParticleStyle::Swirl => "💨",
        }
    }
}

/// A particle for visual effects (not gameplay-affecting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub style: ParticleStyle,
    pub life: f32,
    pub size: f32,
    /// Chases the player instead of drifting
    pub homing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hazard(pos: Vec2, vel: Vec2) -> Hazard {
        Hazard {
            id: 1,
            pos,
            vel,
            radius: 16.0,
            life: 10.0,
            despawning: false,
        }
    }

    #[test]
    fn test_hazard_bounces_off_walls() {
        let mut h = hazard(Vec2::new(17.0, 300.0), Vec2::new(-100.0, 0.0));
        h.advance(0.05);
        assert!(h.vel.x > 0.0);
        assert!(h.pos.x >= h.radius);
    }

    #[test]
    fn test_despawning_hazard_flies_through() {
        let mut h = hazard(Vec2::new(30.0, 300.0), Vec2::new(50.0, 50.0));
        h.begin_despawn(220.0, 2.5);
        assert!(h.despawning);
        assert_eq!(h.vel, Vec2::new(-220.0, 0.0));
        assert_eq!(h.life, 2.5);

        for _ in 0..20 {
            h.advance(0.05);
        }
        assert!(h.pos.x < 0.0, "despawning hazard should leave the arena");
        assert!(h.is_gone(60.0));
    }

    #[test]
    fn test_begin_despawn_never_extends_life() {
        let mut h = hazard(Vec2::new(640.0, 100.0), Vec2::ZERO);
        h.life = 1.0;
        h.begin_despawn(220.0, 2.5);
        assert_eq!(h.life, 1.0);
        assert_eq!(h.vel, Vec2::new(0.0, -220.0));
    }

    #[test]
    fn test_fire_velocity_decays() {
        let mut f = Fire {
            id: 1,
            pos: Vec2::ZERO,
            vel: Vec2::new(400.0, 0.0),
            radius: 14.0,
            life: 2.5,
        };
        f.advance(0.016, 0.998);
        assert!((f.vel.x - 399.2).abs() < 1e-3);
        assert!(f.life < 2.5);
    }

    #[test]
    fn test_missile_reaped_outside_margin() {
        let mut m = Missile {
            id: 1,
            kind: MissileKind::Vehicle,
            pos: Vec2::new(ARENA_W + MISSILE_MARGIN - 1.0, 300.0),
            vel: Vec2::new(400.0, 0.0),
            radius: 22.0,
            life: 6.0,
            gravity: 0.0,
        };
        assert!(!m.is_gone());
        m.advance(0.05);
        assert!(m.is_gone());
    }
}
