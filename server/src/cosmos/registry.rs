use std::collections::HashMap;

use log::trace;

use intercession_shared::{BitReader, SerdeErr, SpacetimeComponent};

use super::{
    component::ErasedComponent, Behavior, CausalChain, Component, ComponentCategory,
    ComponentKind, Timejump, Transform, Velocity,
};
use crate::CosmosError;

type ReadFn = fn(&mut BitReader) -> Result<Box<dyn ErasedComponent>, SerdeErr>;

fn read_component<C: Component>(reader: &mut BitReader) -> Result<Box<dyn ErasedComponent>, SerdeErr> {
    Ok(Box::new(C::de(reader)?))
}

struct ComponentEntry {
    name: &'static str,
    category: ComponentCategory,
    read: ReadFn,
}

/// Maps component kinds to the code able to decode them.
///
/// Built once at startup and shared by `Arc` between a timeslice's cosmos
/// and every parallel cosmos seeded from it.
pub struct ComponentRegistry {
    entries: HashMap<ComponentKind, ComponentEntry>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// A registry holding every component the temporal subsystem relies on
    pub fn with_builtin_components() -> Result<Self, CosmosError> {
        let mut registry = Self::new();
        registry.register::<Transform>()?;
        registry.register::<Velocity>()?;
        registry.register::<SpacetimeComponent>()?;
        registry.register::<CausalChain>()?;
        registry.register::<Timejump>()?;
        registry.register::<Behavior>()?;
        Ok(registry)
    }

    pub fn register<C: Component>(&mut self) -> Result<(), CosmosError> {
        if C::KIND.id() >= ComponentKind::MAX {
            return Err(CosmosError::KindOutOfRange {
                kind: C::KIND,
                name: C::NAME,
                max: ComponentKind::MAX,
            });
        }
        if let Some(existing) = self.entries.get(&C::KIND) {
            return Err(CosmosError::ComponentKindTaken {
                kind: C::KIND,
                existing: existing.name,
                name: C::NAME,
            });
        }

        trace!("registered component {} as {:?}", C::NAME, C::KIND);
        self.entries.insert(
            C::KIND,
            ComponentEntry {
                name: C::NAME,
                category: C::CATEGORY,
                read: read_component::<C>,
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, kind: ComponentKind) -> bool {
        self.entries.contains_key(&kind)
    }

    pub fn name(&self, kind: ComponentKind) -> Result<&'static str, CosmosError> {
        Ok(self.entry(kind)?.name)
    }

    pub fn category(&self, kind: ComponentKind) -> Result<ComponentCategory, CosmosError> {
        Ok(self.entry(kind)?.category)
    }

    pub(crate) fn decode(
        &self,
        kind: ComponentKind,
        bytes: &[u8],
    ) -> Result<Box<dyn ErasedComponent>, CosmosError> {
        let entry = self.entry(kind)?;
        let mut reader = BitReader::new(bytes);
        (entry.read)(&mut reader).map_err(|source| CosmosError::ComponentDecode { kind, source })
    }

    fn entry(&self, kind: ComponentKind) -> Result<&ComponentEntry, CosmosError> {
        self.entries
            .get(&kind)
            .ok_or(CosmosError::ComponentNotRegistered { kind })
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
