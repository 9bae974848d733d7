//! Read-only view of the world for presentation
//!
//! Built after every step; nothing here feeds back into the simulation.

use glam::Vec2;
use serde::Serialize;

use super::entities::{Body, MissileKind};
use super::state::{GamePhase, GameState, GameSummary};

/// Draw order, back to front
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Layer {
    Pickup,
    Hazard,
    Projectile,
    Attacker,
    Player,
    Particle,
}

/// One drawable entity
#[derive(Debug, Clone, Serialize)]
pub struct Sprite {
    pub layer: Layer,
    pub pos: Vec2,
    /// Diameter in arena units
    pub size: f32,
    pub glyph: &'static str,
}

/// Heads-up values
#[derive(Debug, Clone, Serialize)]
pub struct Hud {
    pub score: u64,
    pub gems: u32,
    pub health: f32,
    pub max_health: f32,
    pub time_left: f32,
    /// Shield indicator (seconds left)
    pub invulnerable: f32,
    pub buff_active: bool,
    pub buff_remaining: f32,
    pub dash_ready: bool,
}

/// Active telegraph and its remaining time
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WarningView {
    pub active: bool,
    pub remaining: f32,
}

/// Game-over panel contents
#[derive(Debug, Clone, Serialize)]
pub struct GameOverView {
    pub reason: &'static str,
    pub banner: &'static str,
    pub summary: GameSummary,
}

/// Everything presentation needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub hud: Hud,
    pub sprites: Vec<Sprite>,
    pub meteor_warning: WarningView,
    pub convoy_warning: WarningView,
    /// Camera shake (offset magnitude), zero when disabled
    pub shake: f32,
    pub dragon_shadow: Option<Vec2>,
    pub game_over: Option<GameOverView>,
}

fn body_sprite<B: Body>(layer: Layer, body: &B, glyph: &'static str) -> Sprite {
    Sprite {
        layer,
        pos: body.pos(),
        size: body.radius() * 2.0,
        glyph,
    }
}

impl Snapshot {
    /// Build the view for the current state
    pub fn capture(state: &GameState) -> Self {
        let p = &state.player;
        let hud = Hud {
            score: state.score,
            gems: state.gems,
            health: p.health,
            max_health: p.max_health,
            time_left: state.time_left,
            invulnerable: p.invuln,
            buff_active: p.buff_active(),
            buff_remaining: p.buff_left,
            dash_ready: p.dash_cooldown <= 0.0,
        };

        let mut sprites = Vec::with_capacity(
            state.pickups.len()
                + state.hazards.len()
                + state.fires.len()
                + state.comets.len()
                + state.vehicles.len()
                + state.particles.len()
                + 5,
        );
        sprites.extend(
            state
                .pickups
                .iter()
                .map(|k| body_sprite(Layer::Pickup, k, k.kind.glyph())),
        );
        for item in state.food.iter().chain(state.clock_item.iter()) {
            sprites.push(body_sprite(Layer::Pickup, item, item.kind.glyph()));
        }
        sprites.extend(
            state
                .hazards
                .iter()
                .map(|h| body_sprite(Layer::Hazard, h, "🧨")),
        );
        sprites.extend(
            state
                .fires
                .iter()
                .map(|f| body_sprite(Layer::Projectile, f, "🔥")),
        );
        sprites.extend(
            state
                .comets
                .iter()
                .chain(&state.vehicles)
                .map(|m| body_sprite(Layer::Projectile, m, m.kind.glyph())),
        );
        if let Some(dragon) = &state.dragon {
            sprites.push(Sprite {
                layer: Layer::Attacker,
                pos: dragon.pos,
                size: 96.0,
                glyph: "🐉",
            });
        }
        if let Some(tornado) = &state.tornado {
            sprites.push(Sprite {
                layer: Layer::Attacker,
                pos: tornado.pos,
                size: tornado.pull_radius * 2.0,
                glyph: "🌪️",
            });
        }
        if state.phase != GamePhase::Menu {
            sprites.push(Sprite {
                layer: Layer::Player,
                pos: p.pos,
                size: p.size.max_element(),
                glyph: if state.phase == GamePhase::Dying { "😵" } else { "🙂" },
            });
        }
        sprites.extend(state.particles.iter().map(|pt| Sprite {
            layer: Layer::Particle,
            pos: pt.pos,
            size: pt.size,
            glyph: pt.style.glyph(),
        }));
        sprites.sort_by_key(|s| s.layer);

        let game_over = state.outcome.clone().map(|summary| GameOverView {
            reason: summary.reason.as_str(),
            banner: summary.reason.banner(),
            summary,
        });

        Self {
            phase: state.phase,
            hud,
            sprites,
            meteor_warning: WarningView {
                active: state.meteor.active,
                remaining: state.meteor.remaining,
            },
            convoy_warning: WarningView {
                active: state.convoy.active,
                remaining: state.convoy.remaining,
            },
            shake: if state.shake.time > 0.0 {
                state.shake.intensity
            } else {
                0.0
            },
            dragon_shadow: state.dragon.as_ref().and_then(|d| d.shadow()),
            game_over,
        }
    }

    /// Number of sprites of one glyph (handy for text frontends and tests)
    pub fn count(&self, glyph: &str) -> usize {
        self.sprites.iter().filter(|s| s.glyph == glyph).count()
    }

    /// Vehicles in flight
    pub fn vehicles(&self) -> usize {
        self.count(MissileKind::Vehicle.glyph())
    }
}
