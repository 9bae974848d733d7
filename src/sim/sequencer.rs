//! Major events: the shared cooldown gate plus the warning-then-strike
//! sequences (meteor shower, vehicle convoy)
//!
//! A sequence first raises a telegraph (`Warning`) for a fixed time, then
//! queues its objects as a staggered burst. Dragon, shower and convoy starts
//! are serialized through `MajorEventGate`; a convoy may piggyback on a
//! pending shower, and when that shower resolves the two can merge into one
//! interleaved strike that counts as a single major event.

use serde::{Deserialize, Serialize};

use super::schedule::Deferred;
use super::state::{GameState, chance, rnd_count};
use crate::tick_down;

/// Mutually rate-limited "big" events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MajorEvent {
    Dragon,
    MeteorShower,
    VehicleConvoy,
    /// Interleaved comets and vehicles
    Merged,
}

/// A recorded major-event start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventStart {
    pub at: f32,
    pub event: MajorEvent,
}

/// Shared cooldown: no two major events begin within `spacing` seconds,
/// and a pending telegraph holds a reservation until it strikes
#[derive(Debug, Clone)]
pub struct MajorEventGate {
    pub spacing: f32,
    reserved_by: Option<MajorEvent>,
    starts: Vec<EventStart>,
}

impl MajorEventGate {
    pub fn new(spacing: f32) -> Self {
        Self {
            spacing,
            reserved_by: None,
            starts: Vec::new(),
        }
    }

    fn last_start(&self) -> Option<f32> {
        self.starts.last().map(|s| s.at)
    }

    fn spacing_elapsed(&self, now: f32) -> bool {
        self.last_start().is_none_or(|t| now - t >= self.spacing)
    }

    /// A new event may be scheduled right now
    pub fn is_open(&self, now: f32) -> bool {
        self.reserved_by.is_none() && self.spacing_elapsed(now)
    }

    /// Seconds until the spacing window has passed
    pub fn time_until_open(&self, now: f32) -> f32 {
        self.last_start()
            .map_or(0.0, |t| (t + self.spacing - now).max(0.0))
    }

    pub fn reserved_by(&self) -> Option<MajorEvent> {
        self.reserved_by
    }

    /// Hold the gate for a telegraphed event
    pub fn reserve(&mut self, event: MajorEvent) {
        self.reserved_by = Some(event);
    }

    /// The given event may strike now (its own reservation does not block it)
    pub fn may_trigger(&self, now: f32, event: MajorEvent) -> bool {
        self.spacing_elapsed(now) && self.reserved_by.is_none_or(|r| r == event)
    }

    /// Record an event start and release any reservation
    pub fn record(&mut self, now: f32, event: MajorEvent) {
        self.reserved_by = None;
        self.starts.push(EventStart { at: now, event });
    }

    /// Every start this round, oldest first
    pub fn starts(&self) -> &[EventStart] {
        &self.starts
    }
}

/// Telegraph phase of a sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Warning {
    pub active: bool,
    /// Telegraph time left (seconds)
    pub remaining: f32,
    /// Objects the strike will spawn
    pub count: u32,
    /// Piggybacking on another pending warning without its own reservation
    pub joined: bool,
}

impl Warning {
    fn begin(&mut self, telegraph: f32, count: u32, joined: bool) {
        self.active = true;
        self.remaining = telegraph;
        self.count = count;
        self.joined = joined;
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Meteor shower scheduler: telegraph only when the gate is open
pub fn try_schedule_meteor(state: &mut GameState, dt: f32) {
    let t = state.tuning.meteor.clone();
    if !t.enabled || !state.schedulers.meteor.advance(dt) {
        return;
    }
    state.schedulers.meteor.rearm(&mut state.rng, t.interval_min, t.interval_max);

    if state.meteor.active || !state.gate.is_open(state.clock) {
        return;
    }
    if !chance(&mut state.rng, t.chance) {
        return;
    }

    let count = rnd_count(&mut state.rng, t.count_min, t.count_max);
    state.meteor.begin(t.telegraph, count, false);
    state.gate.reserve(MajorEvent::MeteorShower);
    log::info!("Meteor warning: {} comets in {:.1}s", count, t.telegraph);
}

/// Convoy scheduler: telegraph when the gate is open, or join a pending shower
pub fn try_schedule_convoy(state: &mut GameState, dt: f32) {
    let t = state.tuning.convoy.clone();
    if !t.enabled || !state.schedulers.convoy.advance(dt) {
        return;
    }
    state.schedulers.convoy.rearm(&mut state.rng, t.interval_min, t.interval_max);

    if state.convoy.active {
        return;
    }
    let joining = state.meteor.active
        && state.gate.reserved_by() == Some(MajorEvent::MeteorShower);
    if !joining && !state.gate.is_open(state.clock) {
        return;
    }
    if !chance(&mut state.rng, t.chance) {
        return;
    }

    let count = rnd_count(&mut state.rng, t.count_min, t.count_max);
    state.convoy.begin(t.telegraph, count, joining);
    if !joining {
        state.gate.reserve(MajorEvent::VehicleConvoy);
    }
    log::info!(
        "Convoy warning: {} vehicles in {:.1}s{}",
        count,
        t.telegraph,
        if joining { " (alongside meteors)" } else { "" }
    );
}

/// Count down telegraphs and strike when they resolve
pub fn advance_warnings(state: &mut GameState, dt: f32) {
    let now = state.clock;

    if state.meteor.active {
        tick_down(&mut state.meteor.remaining, dt);
        if state.meteor.remaining <= 0.0 && state.gate.may_trigger(now, MajorEvent::MeteorShower) {
            if state.convoy.active && chance(&mut state.rng, state.tuning.merge_chance) {
                trigger_merged(state);
            } else {
                trigger_meteor(state);
                if state.convoy.active && state.convoy.joined {
                    // Hold the joined convoy until the spacing window has passed
                    state.convoy.remaining = state
                        .convoy
                        .remaining
                        .max(state.gate.time_until_open(now));
                    state.convoy.joined = false;
                    state.gate.reserve(MajorEvent::VehicleConvoy);
                }
            }
        }
    }

    if state.convoy.active {
        tick_down(&mut state.convoy.remaining, dt);
        if state.convoy.remaining <= 0.0 && state.gate.may_trigger(now, MajorEvent::VehicleConvoy) {
            trigger_convoy(state);
        }
    }
}

fn trigger_meteor(state: &mut GameState) {
    let now = state.clock;
    let stagger = state.tuning.meteor.stagger;
    for i in 0..state.meteor.count {
        state.queue.push(now + i as f32 * stagger, Deferred::Comet);
    }
    log::info!("Meteor shower: {} comets", state.meteor.count);
    state.gate.record(now, MajorEvent::MeteorShower);
    state.meteor.clear();
}

fn trigger_convoy(state: &mut GameState) {
    let now = state.clock;
    let stagger = state.tuning.convoy.stagger;
    for i in 0..state.convoy.count {
        state.queue.push(now + i as f32 * stagger, Deferred::Vehicle);
    }
    log::info!("Vehicle convoy: {} vehicles", state.convoy.count);
    state.gate.record(now, MajorEvent::VehicleConvoy);
    state.convoy.clear();
}

/// Both pending strikes as one alternating wave, recorded once
fn trigger_merged(state: &mut GameState) {
    let now = state.clock;
    let stagger = state.tuning.meteor.stagger.min(state.tuning.convoy.stagger);
    let (mut comets, mut vehicles) = (state.meteor.count, state.convoy.count);

    let mut slot = 0u32;
    while comets > 0 || vehicles > 0 {
        let at = now + slot as f32 * stagger;
        if comets > 0 {
            state.queue.push(at, Deferred::Comet);
            comets -= 1;
        }
        if vehicles > 0 {
            state.queue.push(at, Deferred::Vehicle);
            vehicles -= 1;
        }
        slot += 1;
    }

    log::info!(
        "Merged strike: {} comets + {} vehicles",
        state.meteor.count,
        state.convoy.count
    );
    state.gate.record(now, MajorEvent::Merged);
    state.meteor.clear();
    state.convoy.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Difficulty;

    fn round() -> GameState {
        let mut state = GameState::new(5, Difficulty::Normal);
        state.start_round();
        state
    }

    #[test]
    fn test_gate_blocks_within_spacing() {
        let mut gate = MajorEventGate::new(10.0);
        assert!(gate.is_open(0.0));
        gate.record(1.0, MajorEvent::Dragon);
        assert!(!gate.is_open(10.9));
        assert!(gate.is_open(11.0));
        assert!((gate.time_until_open(4.0) - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_reservation_only_admits_owner() {
        let mut gate = MajorEventGate::new(10.0);
        gate.reserve(MajorEvent::MeteorShower);
        assert!(!gate.is_open(0.0));
        assert!(gate.may_trigger(0.0, MajorEvent::MeteorShower));
        assert!(!gate.may_trigger(0.0, MajorEvent::VehicleConvoy));
        gate.record(0.0, MajorEvent::MeteorShower);
        assert_eq!(gate.reserved_by(), None);
    }

    #[test]
    fn test_meteor_warning_then_staggered_strike() {
        let mut state = round();
        state.tuning.meteor.chance = 1.0;
        let threshold = state.schedulers.meteor.threshold;
        try_schedule_meteor(&mut state, threshold + 0.01);

        assert!(state.meteor.active);
        let count = state.meteor.count;
        let telegraph = state.tuning.meteor.telegraph;
        assert_eq!(state.meteor.remaining, telegraph);

        // Still telegraphing
        advance_warnings(&mut state, telegraph / 2.0);
        assert!(state.meteor.active);
        assert!(state.queue.is_empty());

        advance_warnings(&mut state, telegraph);
        assert!(!state.meteor.active);
        assert_eq!(state.queue.count(Deferred::Comet), count as usize);
        assert_eq!(state.gate.starts().len(), 1);
        assert_eq!(state.gate.starts()[0].event, MajorEvent::MeteorShower);
    }

    #[test]
    fn test_convoy_blocked_while_gate_closed() {
        let mut state = round();
        state.gate.record(0.0, MajorEvent::Dragon);
        state.tuning.convoy.chance = 1.0;
        let threshold = state.schedulers.convoy.threshold;
        state.clock = 1.0;
        try_schedule_convoy(&mut state, threshold + 0.01);
        assert!(!state.convoy.active);
    }

    #[test]
    fn test_merged_strike_records_once() {
        let mut state = round();
        state.tuning.meteor.chance = 1.0;
        state.tuning.convoy.chance = 1.0;
        state.tuning.merge_chance = 1.0;

        let threshold = state.schedulers.meteor.threshold;
        try_schedule_meteor(&mut state, threshold + 0.01);
        let threshold = state.schedulers.convoy.threshold;
        try_schedule_convoy(&mut state, threshold + 0.01);
        assert!(state.convoy.active && state.convoy.joined);

        let (comets, vehicles) = (state.meteor.count, state.convoy.count);
        let telegraph = state.tuning.meteor.telegraph;
        advance_warnings(&mut state, telegraph + 0.01);

        assert!(!state.meteor.active && !state.convoy.active);
        assert_eq!(state.gate.starts().len(), 1);
        assert_eq!(state.gate.starts()[0].event, MajorEvent::Merged);
        assert_eq!(state.queue.count(Deferred::Comet), comets as usize);
        assert_eq!(state.queue.count(Deferred::Vehicle), vehicles as usize);
    }

    #[test]
    fn test_unmerged_convoy_waits_out_spacing() {
        let mut state = round();
        state.tuning.meteor.chance = 1.0;
        state.tuning.convoy.chance = 1.0;
        state.tuning.merge_chance = 0.0;
        let spacing = state.gate.spacing;

        let threshold = state.schedulers.meteor.threshold;
        try_schedule_meteor(&mut state, threshold + 0.01);
        let threshold = state.schedulers.convoy.threshold;
        try_schedule_convoy(&mut state, threshold + 0.01);

        let dt = 0.05;
        let mut starts_at = Vec::new();
        for _ in 0..((spacing + 5.0) / dt) as usize {
            state.clock += dt;
            advance_warnings(&mut state, dt);
            if state.gate.starts().len() > starts_at.len() {
                starts_at.push(state.clock);
            }
        }

        let starts = state.gate.starts();
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0].event, MajorEvent::MeteorShower);
        assert_eq!(starts[1].event, MajorEvent::VehicleConvoy);
        assert!(starts[1].at - starts[0].at >= spacing - 1e-3);
    }
}
