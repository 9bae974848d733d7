//! Data-driven game balance
//!
//! Every threshold, probability, speed and damage amount the simulation uses.
//! `Tuning::for_difficulty` gives the built-in balance; a JSON document can
//! override any subset of fields; missing fields keep the values of the
//! difficulty it is layered on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::settings::Difficulty;

/// Player movement, health and dash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub width: f32,
    pub height: f32,
    pub base_speed: f32,
    pub start_health: f32,
    pub max_health: f32,
    /// Invulnerability granted after any damage (seconds)
    pub invuln_window: f32,
    pub dash_cooldown: f32,
    /// Dash requests shorter than this are ignored
    pub dash_min: f32,
    pub dash_max: f32,
    pub dash_shake_secs: f32,
    pub dash_shake_strength: f32,
    pub speed_buff_mult: f32,
    pub speed_buff_secs: f32,
    /// Inset subtracted from contact radius for beneficial pickups
    pub pickup_inset: f32,
    /// Inset subtracted from contact radius for damaging entities
    pub hazard_inset: f32,
    /// Initial upward velocity of the death fall (negative is up)
    pub death_jump: f32,
    pub death_gravity: f32,
    /// Horizontal carry of the death fall per unit of knockback direction
    pub death_carry: f32,
    /// How far below the arena the body must fall before the round ends
    pub death_margin: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 28.0,
            height: 28.0,
            base_speed: 160.0,
            start_health: 3.0,
            max_health: 4.0,
            invuln_window: 1.0,
            dash_cooldown: 0.45,
            dash_min: 30.0,
            dash_max: 110.0,
            dash_shake_secs: 0.12,
            dash_shake_strength: 5.0,
            speed_buff_mult: 1.5,
            speed_buff_secs: 5.0,
            pickup_inset: 4.0,
            hazard_inset: 6.0,
            death_jump: -420.0,
            death_gravity: 900.0,
            death_carry: 60.0,
            death_margin: 60.0,
        }
    }
}

/// Relative weights for the non-gem pickups the batch spawner may add
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupWeights {
    pub shrimp: f32,
    pub milktea: f32,
    pub sushi: f32,
    pub magnet: f32,
}

impl Default for PickupWeights {
    fn default() -> Self {
        Self {
            shrimp: 0.35,
            milktea: 0.25,
            sushi: 0.15,
            magnet: 0.25,
        }
    }
}

/// Gems and pooled pickups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    pub gem_radius: f32,
    pub gem_value: u32,
    /// Score awarded per unit of gem value
    pub gem_score: u64,
    /// Score added per gem when the round ends
    pub final_gem_bonus: u64,
    pub initial_gems: u32,
    pub respawn_delay_min: f32,
    pub respawn_delay_max: f32,
    pub batch_interval_min: f32,
    pub batch_interval_max: f32,
    pub batch_gems: u32,
    /// Chance a batch also carries one non-gem pickup
    pub extra_chance: f32,
    pub extra_weights: PickupWeights,
    pub item_radius: f32,
    pub pool_cap: usize,
    pub shrimp_heal: f32,
    pub sushi_heal: f32,
    pub clock_bonus_min: f32,
    pub clock_bonus_max: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            gem_radius: 12.0,
            gem_value: 1,
            gem_score: 10,
            final_gem_bonus: 5,
            initial_gems: 4,
            respawn_delay_min: 0.4,
            respawn_delay_max: 1.2,
            batch_interval_min: 6.0,
            batch_interval_max: 10.0,
            batch_gems: 3,
            extra_chance: 0.55,
            extra_weights: PickupWeights::default(),
            item_radius: 14.0,
            pool_cap: 24,
            shrimp_heal: 0.5,
            sushi_heal: 1.0,
            clock_bonus_min: 5.0,
            clock_bonus_max: 10.0,
        }
    }
}

/// Dynamite population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardTuning {
    pub radius: f32,
    /// Hard ceiling on the pool size (despawning hazards included)
    pub cap: usize,
    /// Population kept in play at all times
    pub floor: usize,
    pub spawn_interval: f32,
    /// Max speed per axis for the opening population
    pub initial_speed: f32,
    /// Max speed per axis for continuously spawned hazards
    pub spawn_speed: f32,
    /// Lifetime of a fresh hazard; long enough that the cap, not expiry,
    /// normally retires hazards
    pub life_min: f32,
    pub life_max: f32,
    pub despawn_speed: f32,
    pub despawn_life: f32,
    /// How far past the arena a despawning hazard travels before culling
    pub offscreen_margin: f32,
    /// Minimum distance from the player for a fresh hazard
    pub safe_distance: f32,
}

impl Default for HazardTuning {
    fn default() -> Self {
        Self {
            radius: 16.0,
            cap: 8,
            floor: 3,
            spawn_interval: 5.0,
            initial_speed: 80.0,
            spawn_speed: 120.0,
            life_min: 45.0,
            life_max: 75.0,
            despawn_speed: 220.0,
            despawn_life: 2.5,
            offscreen_margin: 60.0,
            safe_distance: 120.0,
        }
    }
}

/// Timed singleton item (food heal or clock bonus)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialTuning {
    pub interval_min: f32,
    pub interval_max: f32,
    pub chance: f32,
    pub life_min: f32,
    pub life_max: f32,
    pub radius: f32,
}

impl SpecialTuning {
    fn food() -> Self {
        Self {
            interval_min: 10.0,
            interval_max: 32.0,
            chance: 0.44,
            life_min: 12.0,
            life_max: 28.0,
            radius: 16.0,
        }
    }

    fn clock() -> Self {
        Self {
            interval_min: 14.0,
            interval_max: 26.0,
            chance: 0.4,
            life_min: 8.0,
            life_max: 14.0,
            radius: 16.0,
        }
    }
}

impl Default for SpecialTuning {
    fn default() -> Self {
        Self::food()
    }
}

/// Consequences of one damaging contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitProfile {
    pub damage: f32,
    pub knockback: f32,
    pub shake_secs: f32,
    pub shake_strength: f32,
}

impl HitProfile {
    const fn new(damage: f32, knockback: f32, shake_secs: f32, shake_strength: f32) -> Self {
        Self {
            damage,
            knockback,
            shake_secs,
            shake_strength,
        }
    }
}

/// Hit profiles per damage source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTuning {
    pub dynamite: HitProfile,
    pub fire: HitProfile,
    pub comet: HitProfile,
    pub vehicle: HitProfile,
}

impl Default for HitTuning {
    fn default() -> Self {
        Self {
            dynamite: HitProfile::new(1.0, 36.0, 0.55, 8.0),
            fire: HitProfile::new(0.5, 28.0, 0.35, 10.0),
            comet: HitProfile::new(1.0, 44.0, 0.5, 12.0),
            vehicle: HitProfile::new(1.5, 60.0, 0.6, 14.0),
        }
    }
}

/// Dragon attack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragonTuning {
    pub enabled: bool,
    pub interval_min: f32,
    pub interval_max: f32,
    pub chance: f32,
    /// Horizontal distance outside the arena where the dragon enters
    pub entry_offset_x: f32,
    /// Entry height (negative is above the arena)
    pub entry_y: f32,
    /// Keeps the landing column this far from either side wall
    pub landing_inset: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub descend_speed: f32,
    pub drop_speed: f32,
    pub surface_min: f32,
    pub surface_max: f32,
    pub align_tolerance: f32,
    pub burst_min: u32,
    pub burst_max: u32,
    pub burst_interval_min: f32,
    pub burst_interval_max: f32,
    pub leave_delay: f32,
    pub leave_boost: f32,
    pub leave_lift: f32,
    pub leave_accel: f32,
    pub exit_margin: f32,
    pub fire_speed_min: f32,
    pub fire_speed_max: f32,
    pub fire_radius: f32,
    pub fire_life: f32,
    /// Per-tick velocity factor applied to fire bolts
    pub fire_drag: f32,
    /// Bolts leave from this far below the dragon's centre
    pub mouth_offset: f32,
    /// Delay before the first bolt of a burst
    pub first_bolt_delay: f32,
    /// Random offset added to the aim point, per axis
    pub aim_jitter_x: f32,
    pub aim_jitter_y: f32,
    /// Random velocity added to each bolt, per axis
    pub bolt_jitter_x: f32,
    pub bolt_jitter_y: f32,
    /// Ground shadow sits this far below the target height
    pub shadow_offset: f32,
}

impl Default for DragonTuning {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_min: 5.0,
            interval_max: 9.0,
            chance: 0.65,
            entry_offset_x: 160.0,
            entry_y: -180.0,
            landing_inset: 120.0,
            speed_min: 160.0,
            speed_max: 240.0,
            descend_speed: 60.0,
            drop_speed: 300.0,
            surface_min: 100.0,
            surface_max: 220.0,
            align_tolerance: 8.0,
            burst_min: 8,
            burst_max: 17,
            burst_interval_min: 0.05,
            burst_interval_max: 0.11,
            leave_delay: 0.22,
            leave_boost: 120.0,
            leave_lift: -300.0,
            leave_accel: -420.0,
            exit_margin: 300.0,
            fire_speed_min: 420.0,
            fire_speed_max: 580.0,
            fire_radius: 14.0,
            fire_life: 2.5,
            fire_drag: 0.998,
            mouth_offset: 28.0,
            first_bolt_delay: 0.05,
            aim_jitter_x: 70.0,
            aim_jitter_y: 30.0,
            bolt_jitter_x: 40.0,
            bolt_jitter_y: 30.0,
            shadow_offset: 26.0,
        }
    }
}

/// Warning-then-strike event (meteor shower or vehicle convoy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceTuning {
    pub enabled: bool,
    pub interval_min: f32,
    pub interval_max: f32,
    pub chance: f32,
    /// Telegraph duration before the strike
    pub telegraph: f32,
    pub count_min: u32,
    pub count_max: u32,
    /// Delay between consecutive objects of one strike
    pub stagger: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub radius: f32,
    pub life: f32,
    /// Downward acceleration (comets only)
    pub gravity: f32,
    /// Distance outside the arena where objects appear
    pub entry_offset: f32,
    /// Random offset around the player used as the aim point (comets only)
    pub aim_jitter_x: f32,
    pub aim_jitter_y: f32,
    /// Keeps lanes this far from the top and bottom walls (vehicles only)
    pub lane_inset: f32,
}

impl SequenceTuning {
    fn meteor() -> Self {
        Self {
            enabled: true,
            interval_min: 14.0,
            interval_max: 20.0,
            chance: 0.45,
            telegraph: 2.5,
            count_min: 6,
            count_max: 12,
            stagger: 0.12,
            speed_min: 380.0,
            speed_max: 520.0,
            radius: 18.0,
            life: 4.0,
            gravity: 140.0,
            entry_offset: 40.0,
            aim_jitter_x: 200.0,
            aim_jitter_y: 120.0,
            lane_inset: 0.0,
        }
    }

    fn convoy() -> Self {
        Self {
            enabled: true,
            interval_min: 12.0,
            interval_max: 18.0,
            chance: 0.4,
            telegraph: 2.0,
            count_min: 3,
            count_max: 6,
            stagger: 0.35,
            speed_min: 300.0,
            speed_max: 420.0,
            radius: 22.0,
            life: 6.0,
            gravity: 0.0,
            entry_offset: 50.0,
            aim_jitter_x: 0.0,
            aim_jitter_y: 0.0,
            lane_inset: 60.0,
        }
    }
}

impl Default for SequenceTuning {
    fn default() -> Self {
        Self::meteor()
    }
}

/// Sweeping vortex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TornadoTuning {
    pub enabled: bool,
    pub check_interval: f32,
    pub chance: f32,
    /// Minimum pickups + hazards + fires before a tornado may appear
    pub density: usize,
    pub cooldown: f32,
    pub duration_min: f32,
    pub duration_max: f32,
    pub pull_radius: f32,
    pub zigzag_chance: f32,
    pub zigzag_amp_min: f32,
    pub zigzag_amp_max: f32,
    /// Zigzag amplitude ceiling as a fraction of arena width
    pub max_amp_fraction: f32,
    pub zigzag_waves_min: f32,
    pub zigzag_waves_max: f32,
    /// How far outside the arena the path corners sit
    pub corner_offset: f32,
}

impl Default for TornadoTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: 1.5,
            chance: 0.5,
            density: 10,
            cooldown: 20.0,
            duration_min: 6.0,
            duration_max: 10.0,
            pull_radius: 70.0,
            zigzag_chance: 0.5,
            zigzag_amp_min: 40.0,
            zigzag_amp_max: 160.0,
            max_amp_fraction: 0.12,
            zigzag_waves_min: 2.0,
            zigzag_waves_max: 4.0,
            corner_offset: 80.0,
        }
    }
}

/// Complete balance sheet for one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Countdown length (seconds)
    pub round_seconds: f32,
    /// Ceiling for the countdown after clock bonuses
    pub max_time_left: f32,
    pub player: PlayerTuning,
    pub pickups: PickupTuning,
    pub hazards: HazardTuning,
    pub food: SpecialTuning,
    pub clock: SpecialTuning,
    pub hits: HitTuning,
    pub dragon: DragonTuning,
    pub meteor: SequenceTuning,
    pub convoy: SequenceTuning,
    /// Chance that a pending convoy merges into a resolving meteor shower
    pub merge_chance: f32,
    /// Minimum spacing between major event starts (seconds)
    pub major_event_spacing: f32,
    pub tornado: TornadoTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            round_seconds: 60.0,
            max_time_left: 99.0,
            player: PlayerTuning::default(),
            pickups: PickupTuning::default(),
            hazards: HazardTuning::default(),
            food: SpecialTuning::food(),
            clock: SpecialTuning::clock(),
            hits: HitTuning::default(),
            dragon: DragonTuning::default(),
            meteor: SequenceTuning::meteor(),
            convoy: SequenceTuning::convoy(),
            merge_chance: 0.5,
            major_event_spacing: 12.0,
            tornado: TornadoTuning::default(),
        }
    }
}

impl Tuning {
    /// Built-in balance for a difficulty level
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        let mut t = Self::default();
        match difficulty {
            Difficulty::Easy => {
                t.round_seconds = 90.0;
                t.hazards.floor = 2;
                t.hazards.spawn_interval = 7.0;
                t.food.chance = 0.28;
                t.meteor.chance = 0.25;
                t.convoy.chance = 0.2;
                t.major_event_spacing = 16.0;
                t.tornado.density = 12;
            }
            Difficulty::Normal => {}
            Difficulty::Hard => {
                t.round_seconds = 45.0;
                t.player.base_speed = 200.0;
                t.hazards.spawn_interval = 3.5;
                t.hazards.initial_speed = 140.0;
                t.hazards.spawn_speed = 160.0;
                t.food.chance = 0.7;
                t.dragon.enabled = true;
                t.meteor.chance = 0.6;
                t.meteor.interval_min = 10.0;
                t.meteor.interval_max = 16.0;
                t.meteor.count_min = 10;
                t.meteor.count_max = 16;
                t.meteor.speed_min *= 1.2;
                t.meteor.speed_max *= 1.2;
                t.convoy.chance = 0.55;
                t.convoy.speed_min *= 1.2;
                t.convoy.speed_max *= 1.2;
                t.major_event_spacing = 9.0;
                t.tornado.density = 8;
            }
        }
        t
    }

    /// Parse a JSON override document over the Normal balance
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Self::default().overlay_json(json)
    }

    /// Apply a JSON override document on top of `self`; fields the document
    /// leaves out (at any depth) keep their current values
    pub fn overlay_json(&self, json: &str) -> serde_json::Result<Self> {
        fn merge(base: &mut Value, patch: Value) {
            match (base, patch) {
                (Value::Object(base), Value::Object(patch)) => {
                    for (key, value) in patch {
                        merge(base.entry(key).or_insert(Value::Null), value);
                    }
                }
                (base, patch) => *base = patch,
            }
        }

        let patch: Value = serde_json::from_str(json)?;
        let mut merged = serde_json::to_value(self)?;
        merge(&mut merged, patch);
        serde_json::from_value::<Self>(merged).map(Self::sanitized)
    }

    /// Layer `json` (if given) over the difficulty's built-in balance,
    /// falling back to that balance alone when it does not parse
    pub fn load_or_default(json: Option<&str>, difficulty: Difficulty) -> Self {
        let base = Self::for_difficulty(difficulty);
        match json.map(|text| base.overlay_json(text)) {
            Some(Ok(tuning)) => {
                log::info!("Loaded tuning overrides over {} balance", difficulty.as_str());
                tuning
            }
            Some(Err(e)) => {
                log::warn!("Ignoring invalid tuning ({}), using {} defaults", e, difficulty.as_str());
                base
            }
            None => base,
        }
    }

    /// Clamp every value into a usable range (probabilities into [0, 1],
    /// ranges ordered, durations non-negative)
    pub fn sanitized(mut self) -> Self {
        fn prob(p: &mut f32) {
            *p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        }
        fn non_neg(v: &mut f32) {
            *v = if v.is_finite() { v.max(0.0) } else { 0.0 };
        }
        fn range(min: &mut f32, max: &mut f32) {
            non_neg(min);
            non_neg(max);
            if *min > *max {
                std::mem::swap(min, max);
            }
        }

        non_neg(&mut self.round_seconds);
        non_neg(&mut self.max_time_left);
        self.max_time_left = self.max_time_left.max(self.round_seconds);
        non_neg(&mut self.major_event_spacing);
        prob(&mut self.merge_chance);

        let p = &mut self.player;
        p.max_health = if p.max_health.is_finite() { p.max_health.max(0.5) } else { 4.0 };
        p.start_health = p.start_health.clamp(0.5, p.max_health);
        non_neg(&mut p.invuln_window);
        non_neg(&mut p.dash_cooldown);
        range(&mut p.dash_min, &mut p.dash_max);
        non_neg(&mut p.speed_buff_secs);
        non_neg(&mut p.base_speed);

        let k = &mut self.pickups;
        range(&mut k.respawn_delay_min, &mut k.respawn_delay_max);
        range(&mut k.batch_interval_min, &mut k.batch_interval_max);
        range(&mut k.clock_bonus_min, &mut k.clock_bonus_max);
        prob(&mut k.extra_chance);
        non_neg(&mut k.shrimp_heal);
        non_neg(&mut k.sushi_heal);

        let h = &mut self.hazards;
        h.floor = h.floor.min(h.cap);
        range(&mut h.life_min, &mut h.life_max);
        non_neg(&mut h.spawn_interval);

        for s in [&mut self.food, &mut self.clock] {
            range(&mut s.interval_min, &mut s.interval_max);
            range(&mut s.life_min, &mut s.life_max);
            prob(&mut s.chance);
        }

        let d = &mut self.dragon;
        range(&mut d.interval_min, &mut d.interval_max);
        range(&mut d.speed_min, &mut d.speed_max);
        range(&mut d.surface_min, &mut d.surface_max);
        range(&mut d.burst_interval_min, &mut d.burst_interval_max);
        range(&mut d.fire_speed_min, &mut d.fire_speed_max);
        prob(&mut d.chance);
        prob(&mut d.fire_drag);
        // A zero interval would never drain the burst timer
        d.burst_interval_min = d.burst_interval_min.max(0.005);
        d.burst_interval_max = d.burst_interval_max.max(d.burst_interval_min);
        non_neg(&mut d.first_bolt_delay);
        d.landing_inset = if d.landing_inset.is_finite() {
            d.landing_inset.clamp(0.0, crate::consts::ARENA_W / 2.0)
        } else {
            0.0
        };
        if d.burst_min > d.burst_max {
            std::mem::swap(&mut d.burst_min, &mut d.burst_max);
        }

        for s in [&mut self.meteor, &mut self.convoy] {
            range(&mut s.interval_min, &mut s.interval_max);
            range(&mut s.speed_min, &mut s.speed_max);
            prob(&mut s.chance);
            non_neg(&mut s.telegraph);
            non_neg(&mut s.stagger);
            non_neg(&mut s.entry_offset);
            s.lane_inset = if s.lane_inset.is_finite() {
                s.lane_inset.clamp(0.0, crate::consts::ARENA_H / 2.0)
            } else {
                0.0
            };
            if s.count_min > s.count_max {
                std::mem::swap(&mut s.count_min, &mut s.count_max);
            }
        }

        let t = &mut self.tornado;
        range(&mut t.duration_min, &mut t.duration_max);
        range(&mut t.zigzag_amp_min, &mut t.zigzag_amp_max);
        range(&mut t.zigzag_waves_min, &mut t.zigzag_waves_max);
        prob(&mut t.chance);
        prob(&mut t.zigzag_chance);
        prob(&mut t.max_amp_fraction);
        non_neg(&mut t.cooldown);
        t.duration_min = t.duration_min.max(0.1);
        t.duration_max = t.duration_max.max(t.duration_min);

        self
    }
}
