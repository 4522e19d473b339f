use std::fmt;

use intercession_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

/// Fixed-timestep tick counter. Wraps around, compare with
/// [`coherency_greater_or_equal`](crate::coherency_greater_or_equal).
pub type Coherency = u16;
/// Ordinal telling apart simultaneous incarnations of one entity.
pub type CausalChainLink = u8;
/// Identity of an entity within its host timeslice.
pub type GenesisId = u16;
/// Identifies a single timejump, shared by its departure and arrival.
pub type TripId = u32;

const TIMESLICE_SHIFT: u16 = 12;
const GENESIS_MASK: u16 = (1 << TIMESLICE_SHIFT) - 1;

/// Largest number of timeslices an entity id can address.
pub const MAX_TIMESLICES: u8 = 16;
/// Largest genesis id a timeslice can hand out.
pub const MAX_GENESIS_ID: GenesisId = GENESIS_MASK;

/// Identifier of one authoritative simulation process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimesliceId(u8);

/// Sentinel for "no timeslice". Outside the addressable 4-bit range, so
/// every dense id `0..16` stays usable.
pub const NULL_TIMESLICE: TimesliceId = TimesliceId(u8::MAX);

impl TimesliceId {
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self == NULL_TIMESLICE
    }

    /// The adjacent earlier timeslice, if any
    pub fn past(self) -> Option<TimesliceId> {
        if self.is_null() || self.0 == 0 {
            return None;
        }
        Some(Self(self.0 - 1))
    }

    /// The adjacent later timeslice, if it is addressable
    pub fn future(self) -> Option<TimesliceId> {
        if self.is_null() || self.0 + 1 >= MAX_TIMESLICES {
            return None;
        }
        Some(Self(self.0 + 1))
    }
}

impl fmt::Debug for TimesliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Timeslice(null)")
        } else {
            write!(f, "Timeslice({})", self.0)
        }
    }
}

impl fmt::Display for TimesliceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serde for TimesliceId {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(u8::de(reader)?))
    }
}

/// An entity identifier: the top 4 bits name the host timeslice, the low
/// 12 bits are the genesis id within it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TemporalEntity(u16);

/// Sentinel for "no entity". Genesis ids are handed out from 1, so this
/// never names a live entity.
pub const NULL_TEMPORAL_ENTITY: TemporalEntity = TemporalEntity(0);

impl TemporalEntity {
    /// `(timeslice << 12) | genesis`
    pub fn compose(timeslice: TimesliceId, genesis_id: GenesisId) -> Self {
        let host = u16::from(timeslice.value()) & 0xF;
        Self((host << TIMESLICE_SHIFT) | (genesis_id & GENESIS_MASK))
    }

    pub const fn from_u16(value: u16) -> Self {
        Self(value)
    }

    pub fn to_u16(self) -> u16 {
        self.0
    }

    /// `id >> 12`
    pub fn timeslice(self) -> TimesliceId {
        TimesliceId::new((self.0 >> TIMESLICE_SHIFT) as u8)
    }

    pub fn genesis_id(self) -> GenesisId {
        self.0 & GENESIS_MASK
    }

    pub fn is_null(self) -> bool {
        self == NULL_TEMPORAL_ENTITY
    }
}

impl fmt::Debug for TemporalEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{})", self.timeslice(), self.genesis_id())
    }
}

impl Serde for TemporalEntity {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(u16::de(reader)?))
    }
}

impl ConstBitLength for TemporalEntity {
    fn const_bit_length() -> u32 {
        16
    }
}
