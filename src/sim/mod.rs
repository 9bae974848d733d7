//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Capped timestep only
//! - Seeded RNG only
//! - Stable iteration order (pool insertion order)
//! - No rendering or platform dependencies

pub mod collision;
pub mod dragon;
pub mod entities;
pub mod player;
pub mod schedule;
pub mod sequencer;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod tornado;

pub use collision::{DamageSource, resolve_contacts, strike};
pub use dragon::{Dragon, DragonState};
pub use entities::{
    Body, Fire, Hazard, Missile, MissileKind, Particle, ParticleStyle, Pickup, PickupKind,
    TimedItem,
};
pub use player::Player;
pub use schedule::{Deferred, SpawnQueue};
pub use sequencer::{EventStart, MajorEvent, MajorEventGate, Warning};
pub use snapshot::{Hud, Layer, Snapshot, Sprite};
pub use state::{GameOverReason, GamePhase, GameState, GameSummary, ScreenShake};
pub use tick::{TickInput, tick};
pub use tornado::Tornado;
