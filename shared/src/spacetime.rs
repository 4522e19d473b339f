use intercession_serde::{BitReader, BitWrite, Serde, SerdeErr};

use crate::{
    coherency::coherency_elapsed,
    math::Vec3,
    types::{Coherency, TripId},
};

/// Squared distance under which two departure origins count as the same.
pub const CONGRUENCE_TOLERANCE_SQUARED: f32 = 2.0;

/// Where an entity stands relative to the timeline its future has seen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimestreamState {
    /// Consistent with what was already sent into the future
    #[default]
    Merged,
    /// Diverged locally, awaiting resolution
    Forked,
    /// Being re-simulated inside a parallel cosmos
    Superposition,
}

impl Serde for TimestreamState {
    fn ser(&self, writer: &mut dyn BitWrite) {
        let tag: u8 = match self {
            Self::Merged => 0,
            Self::Forked => 1,
            Self::Superposition => 2,
        };
        tag.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(Self::Merged),
            1 => Ok(Self::Forked),
            2 => Ok(Self::Superposition),
            _ => Err(SerdeErr::InvalidValue {
                type_name: "TimestreamState",
            }),
        }
    }
}

/// Per-entity timestream state. An entity without one is merged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpacetimeComponent {
    state: TimestreamState,
    state_coherency: Coherency,
}

impl SpacetimeComponent {
    pub fn new(state: TimestreamState, coherency: Coherency) -> Self {
        Self {
            state,
            state_coherency: coherency,
        }
    }

    pub fn state(&self) -> TimestreamState {
        self.state
    }

    /// Coherency at which the state last changed
    pub fn state_coherency(&self) -> Coherency {
        self.state_coherency
    }

    pub fn is_forked(&self) -> bool {
        self.state == TimestreamState::Forked
    }

    pub fn fork(&mut self, now: Coherency) {
        self.transition(TimestreamState::Forked, now);
    }

    pub fn merge(&mut self, now: Coherency) {
        self.transition(TimestreamState::Merged, now);
    }

    pub fn superpose(&mut self, now: Coherency) {
        self.transition(TimestreamState::Superposition, now);
    }

    fn transition(&mut self, state: TimestreamState, now: Coherency) {
        self.state = state;
        self.state_coherency = now;
    }

    /// Ticks spent in the current state
    pub fn elapsed(&self, now: Coherency) -> u16 {
        coherency_elapsed(now, self.state_coherency)
    }
}

impl Serde for SpacetimeComponent {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.state.ser(writer);
        self.state_coherency.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            state: TimestreamState::de(reader)?,
            state_coherency: Coherency::de(reader)?,
        })
    }
}

/// Fingerprint of an entity's state at a timejump departure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimejumpConditions {
    pub trip_id: TripId,
    pub origin: Vec3,
}

impl TimejumpConditions {
    pub fn new(trip_id: TripId, origin: Vec3) -> Self {
        Self { trip_id, origin }
    }

    /// Whether a replayed departure matches this one within tolerance
    pub fn is_congruent(&self, other: &TimejumpConditions) -> bool {
        self.origin.distance_squared(other.origin) <= CONGRUENCE_TOLERANCE_SQUARED
    }
}

impl Serde for TimejumpConditions {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.trip_id.ser(writer);
        self.origin.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            trip_id: TripId::de(reader)?,
            origin: Vec3::de(reader)?,
        })
    }
}
