use std::{collections::HashMap, fmt};

use intercession_shared::{BitReader, BitWrite, Serde, SerdeErr, TemporalEntity};

use super::Cosmos;
use crate::CosmosError;

/// Names a behavior registered with a [`BehaviorRegistry`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BehaviorTag(u16);

impl BehaviorTag {
    pub const fn new(id: u16) -> Self {
        Self(id)
    }
}

impl fmt::Debug for BehaviorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BehaviorTag({})", self.0)
    }
}

impl Serde for BehaviorTag {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self(u16::de(reader)?))
    }
}

/// Runs once per fixed update for every entity carrying the behavior.
/// Behaviors are replayed inside parallel cosmos runs, so they must only
/// depend on cosmos state.
pub type BehaviorFn =
    Box<dyn Fn(&mut Cosmos, TemporalEntity) -> Result<(), CosmosError> + Send + Sync>;

/// Resolves behavior tags to their implementation. Constructed once per
/// process and shared by `Arc` with every cosmos that runs behaviors.
#[derive(Default)]
pub struct BehaviorRegistry {
    behaviors: HashMap<BehaviorTag, BehaviorFn>,
}

impl BehaviorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `behavior` under `tag`, returning whatever it replaced
    pub fn register<F>(&mut self, tag: BehaviorTag, behavior: F) -> Option<BehaviorFn>
    where
        F: Fn(&mut Cosmos, TemporalEntity) -> Result<(), CosmosError> + Send + Sync + 'static,
    {
        self.behaviors.insert(tag, Box::new(behavior))
    }

    pub fn get(&self, tag: BehaviorTag) -> Option<&BehaviorFn> {
        self.behaviors.get(&tag)
    }

    pub fn contains(&self, tag: BehaviorTag) -> bool {
        self.behaviors.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}
