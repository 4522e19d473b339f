use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use log::{debug, warn};

use intercession_shared::{
    BitWriter, CausalChainLink, Coherency, EventKind, GenesisId, Message, MessageError,
    SpacetimeComponent, TemporalEntity, TimejumpConditions, TimesliceId, TimestreamState, TripId,
    MAX_GENESIS_ID,
};

use super::{
    component::ErasedComponent, dynamo::Dynamo, BehaviorRegistry, CausalChain, Component,
    ComponentCategory, ComponentKind, ComponentRegistry, SerializationFilter, Signature,
    Timejump,
};
use crate::CosmosError;

#[derive(Clone, Default)]
struct EntityRecord {
    components: BTreeMap<ComponentKind, Box<dyn ErasedComponent>>,
}

impl EntityRecord {
    fn signature(&self) -> Signature {
        self.components
            .keys()
            .fold(Signature::EMPTY, |signature, kind| signature.with(*kind))
    }
}

/// An entity leaving its cosmos through a timejump, captured at the moment
/// of departure.
#[derive(Clone, Debug)]
pub struct Departure {
    pub entity: TemporalEntity,
    pub destination: TimesliceId,
    pub conditions: TimejumpConditions,
    pub causal_link: Option<CausalChainLink>,
    /// Every component of the entity, in the component block format
    pub components: Message,
}

/// Entity and component storage for one simulation.
///
/// Entities are kept in id order so every fixed update, including the ones
/// replayed by a parallel cosmos, visits them identically.
#[derive(Clone)]
pub struct Cosmos {
    timeslice: TimesliceId,
    coherency: Coherency,
    registry: Arc<ComponentRegistry>,
    entities: BTreeMap<TemporalEntity, EntityRecord>,
    next_genesis: GenesisId,
    next_trip: u32,
    condemned: Vec<TemporalEntity>,
    created: Vec<TemporalEntity>,
    removed: Vec<TemporalEntity>,
    upstream_dirty: BTreeSet<TemporalEntity>,
    newly_forked: Vec<TemporalEntity>,
    departures: Vec<Departure>,
}

impl Cosmos {
    pub fn new(timeslice: TimesliceId, registry: Arc<ComponentRegistry>) -> Self {
        Self {
            timeslice,
            coherency: 0,
            registry,
            entities: BTreeMap::new(),
            next_genesis: 1,
            next_trip: 0,
            condemned: Vec::new(),
            created: Vec::new(),
            removed: Vec::new(),
            upstream_dirty: BTreeSet::new(),
            newly_forked: Vec::new(),
            departures: Vec::new(),
        }
    }

    pub fn timeslice(&self) -> TimesliceId {
        self.timeslice
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    // Coherency

    pub fn get_coherency(&self) -> Coherency {
        self.coherency
    }

    pub fn set_coherency(&mut self, coherency: Coherency) {
        self.coherency = coherency;
    }

    pub fn increment_coherency(&mut self) -> Coherency {
        self.coherency = self.coherency.wrapping_add(1);
        self.coherency
    }

    // Entities

    /// Creates an entity hosted by this timeslice
    pub fn create_entity(&mut self) -> Result<TemporalEntity, CosmosError> {
        let mut genesis = self.next_genesis;
        while genesis <= MAX_GENESIS_ID {
            let entity = TemporalEntity::compose(self.timeslice, genesis);
            if !self.entities.contains_key(&entity) {
                self.next_genesis = genesis + 1;
                self.insert_entity(entity);
                return Ok(entity);
            }
            genesis += 1;
        }
        Err(CosmosError::GenesisExhausted {
            timeslice: self.timeslice,
        })
    }

    /// Registers an entity whose id was handed out elsewhere. Returns false if
    /// it already exists.
    pub fn register_entity(&mut self, entity: TemporalEntity) -> bool {
        if self.entities.contains_key(&entity) {
            return false;
        }
        self.insert_entity(entity);
        true
    }

    fn insert_entity(&mut self, entity: TemporalEntity) {
        self.entities.insert(entity, EntityRecord::default());
        self.created.push(entity);
    }

    pub fn has_entity(&self, entity: TemporalEntity) -> bool {
        self.entities.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Snapshot of every entity, in id order
    pub fn entities(&self) -> Vec<TemporalEntity> {
        self.entities.keys().copied().collect()
    }

    /// Entities carrying at least the components in `signature`
    pub fn entities_with(&self, signature: Signature) -> Vec<TemporalEntity> {
        self.entities
            .iter()
            .filter(|(_, record)| record.signature().contains_all(signature))
            .map(|(entity, _)| *entity)
            .collect()
    }

    /// Marks an entity for removal at the end of the current fixed update
    pub fn condemn_entity(&mut self, entity: TemporalEntity) {
        if !self.entities.contains_key(&entity) {
            warn!("attempting to condemn entity {:?} that does not exist", entity);
            return;
        }
        if !self.condemned.contains(&entity) {
            self.condemned.push(entity);
        }
    }

    pub fn is_condemned(&self, entity: TemporalEntity) -> bool {
        self.condemned.contains(&entity)
    }

    /// Removes every condemned entity, returning how many were removed
    pub fn flush_condemned(&mut self) -> usize {
        let condemned = std::mem::take(&mut self.condemned);
        for entity in &condemned {
            self.entities.remove(entity);
            self.upstream_dirty.remove(entity);
            self.removed.push(*entity);
        }
        condemned.len()
    }

    fn record(&self, entity: TemporalEntity) -> Result<&EntityRecord, CosmosError> {
        self.entities.get(&entity).ok_or(CosmosError::EntityNotFound {
            entity,
            timeslice: self.timeslice,
        })
    }

    fn record_mut(&mut self, entity: TemporalEntity) -> Result<&mut EntityRecord, CosmosError> {
        self.entities
            .get_mut(&entity)
            .ok_or(CosmosError::EntityNotFound {
                entity,
                timeslice: self.timeslice,
            })
    }

    // Components

    pub fn has_component<C: Component>(&self, entity: TemporalEntity) -> bool {
        self.entities
            .get(&entity)
            .map(|record| record.components.contains_key(&C::KIND))
            .unwrap_or(false)
    }

    pub fn get_component<C: Component>(&self, entity: TemporalEntity) -> Option<&C> {
        self.entities
            .get(&entity)?
            .components
            .get(&C::KIND)?
            .as_any()
            .downcast_ref::<C>()
    }

    /// Mutable access. Touching an upstream component queues it for the
    /// next `ENTITY_UPDATE`.
    pub fn get_component_mut<C: Component>(&mut self, entity: TemporalEntity) -> Option<&mut C> {
        let component = self
            .entities
            .get_mut(&entity)?
            .components
            .get_mut(&C::KIND)?
            .as_any_mut()
            .downcast_mut::<C>()?;
        if C::CATEGORY == ComponentCategory::Upstream {
            self.upstream_dirty.insert(entity);
        }
        Some(component)
    }

    /// Inserts or replaces a component
    pub fn add_component<C: Component>(
        &mut self,
        entity: TemporalEntity,
        component: C,
    ) -> Result<(), CosmosError> {
        if !self.registry.is_registered(C::KIND) {
            return Err(CosmosError::ComponentNotRegistered { kind: C::KIND });
        }
        self.record_mut(entity)?
            .components
            .insert(C::KIND, Box::new(component));
        if C::CATEGORY == ComponentCategory::Upstream {
            self.upstream_dirty.insert(entity);
        }
        Ok(())
    }

    pub fn remove_component<C: Component>(&mut self, entity: TemporalEntity) -> Option<C> {
        let removed = self.entities.get_mut(&entity)?.components.remove(&C::KIND)?;
        removed.as_any().downcast_ref::<C>().cloned()
    }

    pub fn get_entity_signature(&self, entity: TemporalEntity) -> Result<Signature, CosmosError> {
        Ok(self.record(entity)?.signature())
    }

    /// Writes the components of `entity` selected by `signature` and
    /// `filter` into `message` as a component block: a count followed by
    /// `(kind, payload)` pairs.
    pub fn serialize_entity_components(
        &self,
        entity: TemporalEntity,
        signature: Signature,
        message: &mut Message,
        filter: SerializationFilter,
    ) -> Result<usize, CosmosError> {
        let record = self.record(entity)?;
        let selected: Vec<(&ComponentKind, &Box<dyn ErasedComponent>)> = record
            .components
            .iter()
            .filter(|(kind, component)| {
                signature.contains(**kind) && filter.accepts(component.category())
            })
            .collect();

        message.push(&(selected.len() as u8));
        for (kind, component) in &selected {
            let mut writer = BitWriter::new();
            component.write(&mut writer);
            message.push(&kind.id()).push(&writer.to_bytes());
        }
        Ok(selected.len())
    }

    /// Reads a component block written by
    /// [`serialize_entity_components`](Cosmos::serialize_entity_components),
    /// applying only the components allowed by `signature` and `filter`.
    /// Returns how many were applied.
    pub fn deserialize_entity_components(
        &mut self,
        entity: TemporalEntity,
        signature: Signature,
        message: &mut Message,
        filter: SerializationFilter,
    ) -> Result<usize, CosmosError> {
        let wrap = |source: MessageError| CosmosError::Deserialize { entity, source };

        self.record(entity)?;
        let count: u8 = message.pop().map_err(wrap)?;
        let mut applied = 0;
        for _ in 0..count {
            let kind = ComponentKind::new(message.pop::<u8>().map_err(wrap)?);
            let payload: Vec<u8> = message.pop().map_err(wrap)?;

            let category = self.registry.category(kind)?;
            if !signature.contains(kind) || !filter.accepts(category) {
                continue;
            }
            let component = self.registry.decode(kind, &payload)?;
            self.record_mut(entity)?.components.insert(kind, component);
            if category == ComponentCategory::Upstream {
                self.upstream_dirty.insert(entity);
            }
            applied += 1;
        }
        Ok(applied)
    }

    pub fn causal_link(&self, entity: TemporalEntity) -> Option<CausalChainLink> {
        self.get_component::<CausalChain>(entity).map(|chain| chain.link)
    }

    pub fn set_causal_link(
        &mut self,
        entity: TemporalEntity,
        link: CausalChainLink,
    ) -> Result<(), CosmosError> {
        self.add_component(entity, CausalChain::new(link))
    }

    // Spacetime

    /// Current timestream state. Entities without a spacetime component are
    /// merged.
    pub fn timestream_state(&self, entity: TemporalEntity) -> TimestreamState {
        self.get_component::<SpacetimeComponent>(entity)
            .map(|spacetime| spacetime.state())
            .unwrap_or_default()
    }

    pub fn fork_entity(&mut self, entity: TemporalEntity) -> Result<(), CosmosError> {
        self.record(entity)?;
        if self.timestream_state(entity) != TimestreamState::Forked {
            self.newly_forked.push(entity);
        }
        self.transition(entity, TimestreamState::Forked)
    }

    pub fn merge_entity(&mut self, entity: TemporalEntity) -> Result<(), CosmosError> {
        self.transition(entity, TimestreamState::Merged)
    }

    pub fn superpose_entity(&mut self, entity: TemporalEntity) -> Result<(), CosmosError> {
        self.transition(entity, TimestreamState::Superposition)
    }

    fn transition(
        &mut self,
        entity: TemporalEntity,
        state: TimestreamState,
    ) -> Result<(), CosmosError> {
        let now = self.coherency;
        if let Some(spacetime) = self.get_component_mut::<SpacetimeComponent>(entity) {
            *spacetime = SpacetimeComponent::new(state, now);
            return Ok(());
        }
        self.add_component(entity, SpacetimeComponent::new(state, now))
    }

    /// Applies an entity event raised by a relay or a parallel run
    pub fn raise_event(&mut self, entity: TemporalEntity, kind: EventKind) -> Result<(), CosmosError> {
        match kind {
            EventKind::TimestreamInterception => {
                debug!("{:?} intercepted at {}", entity, self.coherency);
                self.superpose_entity(entity)
            }
            EventKind::Divergence => {
                debug!("{:?} diverged at {}", entity, self.coherency);
                self.fork_entity(entity)
            }
            other => {
                warn!("cosmos has no handler for {:?} events, ignoring it for {:?}", other, entity);
                Ok(())
            }
        }
    }

    // Timejumps

    /// Schedules `entity` to jump to `destination` on the next fixed update
    pub fn request_timejump(
        &mut self,
        entity: TemporalEntity,
        destination: TimesliceId,
    ) -> Result<TripId, CosmosError> {
        let trip_id = (u32::from(self.timeslice.value()) << 24) | (self.next_trip & 0x00FF_FFFF);
        self.next_trip = self.next_trip.wrapping_add(1);
        self.add_component(
            entity,
            Timejump {
                trip_id,
                destination,
            },
        )?;
        Ok(trip_id)
    }

    pub(crate) fn push_departure(&mut self, departure: Departure) {
        self.departures.push(departure);
    }

    // Outboxes

    pub fn take_departures(&mut self) -> Vec<Departure> {
        std::mem::take(&mut self.departures)
    }

    pub fn take_created(&mut self) -> Vec<TemporalEntity> {
        std::mem::take(&mut self.created)
    }

    pub fn take_removed(&mut self) -> Vec<TemporalEntity> {
        std::mem::take(&mut self.removed)
    }

    /// Entities whose upstream components changed, skipping removed ones
    pub fn take_upstream_dirty(&mut self) -> Vec<TemporalEntity> {
        std::mem::take(&mut self.upstream_dirty).into_iter().collect()
    }

    pub fn take_newly_forked(&mut self) -> Vec<TemporalEntity> {
        std::mem::take(&mut self.newly_forked)
    }

    /// Runs every dynamo once and removes what they condemned
    pub fn fixed_update(&mut self, behaviors: &BehaviorRegistry, delta_secs: f32) -> Result<(), CosmosError> {
        for dynamo in Dynamo::PIPELINE {
            dynamo.run(self, behaviors, delta_secs)?;
        }
        self.flush_condemned();
        Ok(())
    }

    /// A copy holding only the entities `keep` accepts, with empty outboxes.
    /// This is how a parallel cosmos is seeded.
    pub fn seed_copy(&self, keep: impl Fn(TemporalEntity, &Cosmos) -> bool) -> Cosmos {
        let entities = self
            .entities
            .iter()
            .filter(|(entity, _)| keep(**entity, self))
            .map(|(entity, record)| (*entity, record.clone()))
            .collect();

        Cosmos {
            timeslice: self.timeslice,
            coherency: self.coherency,
            registry: self.registry.clone(),
            entities,
            next_genesis: self.next_genesis,
            next_trip: self.next_trip,
            condemned: Vec::new(),
            created: Vec::new(),
            removed: Vec::new(),
            upstream_dirty: BTreeSet::new(),
            newly_forked: Vec::new(),
            departures: Vec::new(),
        }
    }
}
