use thiserror::Error;

use intercession_shared::{
    Coherency, MessageError, MultiplexError, SerdeErr, TemporalEntity, TimesliceId,
};

use crate::cosmos::ComponentKind;

/// Errors raised by the [`Cosmos`](crate::Cosmos) and its registries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CosmosError {
    /// The entity is not registered with this cosmos
    #[error("Entity {entity:?} does not exist in the cosmos of timeslice {timeslice:?}")]
    EntityNotFound {
        entity: TemporalEntity,
        timeslice: TimesliceId,
    },

    /// The component kind was never registered with the `ComponentRegistry`
    #[error("Component kind {kind:?} is not registered. Register it with `ComponentRegistry::register()` before the cosmos starts")]
    ComponentNotRegistered {
        kind: ComponentKind,
    },

    /// Two component types claimed the same kind
    #[error("Component kind {kind:?} is already registered to {existing}, cannot register {name}")]
    ComponentKindTaken {
        kind: ComponentKind,
        existing: &'static str,
        name: &'static str,
    },

    /// A component kind does not fit in a signature
    #[error("Component {name} uses kind {kind:?}, kinds must be below {max}")]
    KindOutOfRange {
        kind: ComponentKind,
        name: &'static str,
        max: u8,
    },

    /// A component payload failed to decode
    #[error("Failed to decode a component of kind {kind:?}: {source}")]
    ComponentDecode {
        kind: ComponentKind,
        #[source]
        source: SerdeErr,
    },

    /// Every genesis id of the timeslice is in use
    #[error("Timeslice {timeslice:?} has no free genesis ids left")]
    GenesisExhausted {
        timeslice: TimesliceId,
    },

    /// Component state failed to decode
    #[error("Failed to deserialize components of entity {entity:?}: {source}")]
    Deserialize {
        entity: TemporalEntity,
        #[source]
        source: MessageError,
    },
}

/// Errors raised by a [`ParallelCosmosContext`](crate::ParallelCosmosContext)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParallelError {
    /// The context still holds a running or unjoined run
    #[error("Parallel cosmos context is not closed. Call `close()` before seeding it again")]
    NotClosed,

    /// The context was never seeded
    #[error("Parallel cosmos context has not been initialized")]
    NotInitialized,

    /// The run is still executing
    #[error("Parallel cosmos is still running, it can only be read once halted")]
    StillRunning,

    /// The run halted short of its target
    #[error("Parallel cosmos halted at coherency {current} before reaching its target {target}")]
    TargetNotReached {
        current: Coherency,
        target: Coherency,
    },

    /// The entity does not exist in the parallel cosmos
    #[error("Entity {entity:?} is not part of the parallel cosmos")]
    EntityNotTracked {
        entity: TemporalEntity,
    },

    /// The simulation thread panicked
    #[error("Parallel cosmos thread panicked, its state has been discarded")]
    TaskPanicked,

    /// The simulation thread could not be spawned
    #[error("Failed to spawn parallel cosmos thread: {reason}")]
    SpawnFailed {
        reason: String,
    },

    #[error(transparent)]
    Cosmos(#[from] CosmosError),

    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Errors raised by a [`TimelineApi`](crate::TimelineApi) and the timeslice
/// driving it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    /// The timeline api was built for an id the multiplex does not hold
    #[error("Cannot build a timeline for timeslice {id:?}, the multiplex only holds {num_timeslices} timeslices")]
    UnknownTimeslice {
        id: TimesliceId,
        num_timeslices: usize,
    },

    /// The weak cosmos handle no longer resolves
    #[error("The cosmos of timeslice {timeslice:?} has been dropped")]
    CosmosExpired {
        timeslice: TimesliceId,
    },

    #[error(transparent)]
    Multiplex(#[from] MultiplexError),

    #[error(transparent)]
    Parallel(#[from] ParallelError),

    #[error(transparent)]
    Cosmos(#[from] CosmosError),

    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Errors raised while building a [`SuperpositionRelay`](crate::SuperpositionRelay)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RelayError {
    /// The maximum forked threshold lies below the minimum
    #[error("forked_threshold_max_secs ({max}) must not be smaller than forked_threshold_min_secs ({min})")]
    ThresholdOrder {
        min: f32,
        max: f32,
    },

    /// A threshold is negative or not a number
    #[error("{field} must be a non-negative number of seconds, got {value}")]
    InvalidThreshold {
        field: &'static str,
        value: f32,
    },
}
