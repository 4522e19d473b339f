//! # Intercession Server
//! Hosts one timeslice of an intercession timeline: its cosmos, the
//! parallel cosmos contexts replaying its neighbouring timestreams, and the
//! superposition relay reconciling divergent futures back into the merged
//! timeline.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use intercession_shared::{
        coherency_greater_or_equal, BitReader, BitWrite, BitWriter, Coherency, EventKind,
        Message, Serde, SerdeErr, TemporalEntity, TimelineConfig, TimesliceId,
    };
}

pub mod cosmos;

mod error;
mod parallel;
mod relay;
mod synchro;
mod timeline;
mod timeslice;

pub use cosmos::{
    Behavior, BehaviorRegistry, BehaviorTag, CausalChain, Component, ComponentCategory,
    ComponentKind, ComponentRegistry, Cosmos, Departure, SerializationFilter, Signature,
    Timejump, Transform, Velocity,
};
pub use error::{CosmosError, ParallelError, RelayError, TimelineError};
pub use parallel::{
    DepartureCheck, DivergenceTracker, ParallelCosmosContext, SimulationTask, TaskSignals,
};
pub use relay::{EngageReport, RelayConfig, SuperpositionRelay};
pub use synchro::SpacetimeSynchro;
pub use timeline::{TimelineApi, TimelineLink};
pub use timeslice::Timeslice;
