//! # Intercession Shared
//! Identifiers, coherency math, thread-safe queues, messages and timestreams
//! shared by every timeslice of an intercession timeline.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

pub use intercession_serde::{
    BitReader, BitWrite, BitWriter, ConstBitLength, Serde, SerdeErr, UnsignedVariableInteger,
};

mod coherency;
mod math;
mod messages;
mod queues;
mod spacetime;
mod timeline;
mod timestream;
mod types;

pub use coherency::{
    coherency_diff, coherency_elapsed, coherency_greater_or_equal, coherency_greater_than,
    coherency_less_than,
};
pub use math::Vec3;
pub use messages::{EventKind, Message, MessageError, MessageHeader, MESSAGE_HEADER_BYTES};
pub use queues::{TsBreakpointQueue, TsQueue};
pub use spacetime::{
    SpacetimeComponent, TimejumpConditions, TimestreamState, CONGRUENCE_TOLERANCE_SQUARED,
};
pub use timeline::{ConfigError, Multiplex, MultiplexError, TimelineConfig};
pub use timestream::{EntityTimestreamMap, TimestampedMessage};
pub use types::{
    CausalChainLink, Coherency, GenesisId, TemporalEntity, TimesliceId, TripId, MAX_GENESIS_ID,
    MAX_TIMESLICES, NULL_TEMPORAL_ENTITY, NULL_TIMESLICE,
};
