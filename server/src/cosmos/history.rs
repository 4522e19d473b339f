//! Encoding of the messages a timeslice pushes into its future timestream,
//! and their replay against a cosmos.

use log::{trace, warn};

use intercession_shared::{
    CausalChainLink, EventKind, Message, MessageError, TemporalEntity, TimejumpConditions,
    TimestampedMessage, NULL_TEMPORAL_ENTITY,
};

use super::{Cosmos, Departure, SerializationFilter, Signature};
use crate::CosmosError;

/// What replaying one timestream message did
#[derive(Debug)]
pub enum Replayed {
    Applied,
    /// The message did not apply to the cosmos in its current state
    Skipped,
    /// A departure recorded in history, left for the caller to compare
    Departure(TimejumpConditions),
    /// An arrival recorded in history, left for the caller to apply
    Arrival(Message),
}

/// Entity, fingerprint and causal chain link leading a `JUMP_ARRIVAL` body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrivalHeader {
    pub entity: TemporalEntity,
    pub conditions: TimejumpConditions,
    pub causal_link: Option<CausalChainLink>,
}

pub fn encode_entity_created(
    cosmos: &Cosmos,
    entity: TemporalEntity,
) -> Result<Message, CosmosError> {
    let mut message = Message::new(EventKind::EntityCreated);
    cosmos.serialize_entity_components(
        entity,
        Signature::ALL,
        &mut message,
        SerializationFilter::All,
    )?;
    Ok(message)
}

pub fn encode_entity_update(
    cosmos: &Cosmos,
    entity: TemporalEntity,
) -> Result<Message, CosmosError> {
    let mut message = Message::new(EventKind::EntityUpdate);
    cosmos.serialize_entity_components(
        entity,
        Signature::ALL,
        &mut message,
        SerializationFilter::Upstream,
    )?;
    Ok(message)
}

pub fn encode_entity_removed() -> Message {
    Message::new(EventKind::EntityRemoved)
}

pub fn encode_departure(conditions: &TimejumpConditions) -> Message {
    let mut message = Message::new(EventKind::JumpDeparture);
    message.push(conditions);
    message
}

/// Builds the `JUMP_ARRIVAL` sent to a departure's destination, carrying
/// `causal_link` in place of the departing entity's own link.
pub fn encode_arrival(departure: &Departure, causal_link: Option<CausalChainLink>) -> Message {
    let mut message = Message::new(EventKind::JumpArrival);
    message
        .push(&departure.entity)
        .push(&departure.conditions)
        .push(&causal_link);
    message.append_bytes(departure.components.body());
    message
}

pub fn read_arrival_header(message: &mut Message) -> Result<ArrivalHeader, MessageError> {
    message.expect_kind(EventKind::JumpArrival)?;
    Ok(ArrivalHeader {
        entity: message.pop()?,
        conditions: message.pop()?,
        causal_link: message.pop()?,
    })
}

/// Writes an arriving entity's components into `cosmos`, registering it or
/// overwriting its existing incarnation. `components` must be positioned at
/// the component block.
pub fn restore_arrival(
    cosmos: &mut Cosmos,
    header: &ArrivalHeader,
    components: &mut Message,
) -> Result<(), CosmosError> {
    let entity = header.entity;
    cosmos.register_entity(entity);
    cosmos.deserialize_entity_components(
        entity,
        Signature::ALL,
        components,
        SerializationFilter::All,
    )?;
    if let Some(link) = header.causal_link {
        cosmos.set_causal_link(entity, link)?;
    }
    Ok(())
}

/// Applies a `JUMP_ARRIVAL` and marks the arrived entity forked, since its
/// presence rewrites history already sent into the future.
pub fn apply_arrival(cosmos: &mut Cosmos, message: &mut Message) -> Result<ArrivalHeader, CosmosError> {
    message.rewind();
    let header = read_arrival_header(message).map_err(|source| CosmosError::Deserialize {
        entity: NULL_TEMPORAL_ENTITY,
        source,
    })?;

    restore_arrival(cosmos, &header, message)?;
    cosmos.fork_entity(header.entity)?;
    trace!("{:?} arrived on trip {}", header.entity, header.conditions.trip_id);
    Ok(header)
}

/// Replays one timestream message for `entity` against `cosmos`
pub fn apply_timestream_message(
    cosmos: &mut Cosmos,
    entity: TemporalEntity,
    stamped: TimestampedMessage,
) -> Result<Replayed, CosmosError> {
    let mut message = stamped.message;
    let wrap = |source: MessageError| CosmosError::Deserialize { entity, source };

    match message.kind() {
        EventKind::EntityCreated => {
            if !cosmos.register_entity(entity) {
                return Ok(Replayed::Skipped);
            }
            cosmos.deserialize_entity_components(
                entity,
                Signature::ALL,
                &mut message,
                SerializationFilter::All,
            )?;
            Ok(Replayed::Applied)
        }
        EventKind::EntityUpdate => {
            if !cosmos.has_entity(entity) {
                return Ok(Replayed::Skipped);
            }
            cosmos.deserialize_entity_components(
                entity,
                Signature::ALL,
                &mut message,
                SerializationFilter::Upstream,
            )?;
            Ok(Replayed::Applied)
        }
        EventKind::EntityRemoved => {
            if !cosmos.has_entity(entity) {
                return Ok(Replayed::Skipped);
            }
            cosmos.condemn_entity(entity);
            Ok(Replayed::Applied)
        }
        EventKind::JumpDeparture => Ok(Replayed::Departure(message.pop().map_err(wrap)?)),
        EventKind::JumpArrival => Ok(Replayed::Arrival(message)),
        other => {
            warn!("{:?} does not belong in a timestream, dropping it for {:?}", other, entity);
            Ok(Replayed::Skipped)
        }
    }
}
