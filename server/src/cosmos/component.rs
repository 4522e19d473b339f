use std::{any::Any, fmt};

use intercession_shared::{BitWrite, Serde};

/// Dense id of a component type, also its bit in a [`Signature`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKind(u8);

impl ComponentKind {
    /// Kinds must stay below this so they fit in a signature
    pub const MAX: u8 = 32;

    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    pub fn id(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.0)
    }
}

/// Whether a component holds input that originates outside the owning
/// timeslice. Only upstream components are carried by `ENTITY_UPDATE`, so a
/// future timeslice's replay never clobbers its own local state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentCategory {
    Local,
    Upstream,
}

/// Selects which components (de)serialization touches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializationFilter {
    All,
    Upstream,
}

impl SerializationFilter {
    pub fn accepts(self, category: ComponentCategory) -> bool {
        match self {
            SerializationFilter::All => true,
            SerializationFilter::Upstream => category == ComponentCategory::Upstream,
        }
    }
}

/// Bitset of the component kinds an entity carries.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Signature(u32);

impl Signature {
    pub const EMPTY: Signature = Signature(0);
    pub const ALL: Signature = Signature(u32::MAX);

    pub fn with(mut self, kind: ComponentKind) -> Self {
        self.insert(kind);
        self
    }

    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= 1 << kind.id();
    }

    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !(1 << kind.id());
    }

    pub fn contains(self, kind: ComponentKind) -> bool {
        self.0 & (1 << kind.id()) != 0
    }

    /// Whether every kind in `other` is also in `self`
    pub fn contains_all(self, other: Signature) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:#034b})", self.0)
    }
}

/// A piece of entity state the cosmos can store, copy into a parallel
/// cosmos and carry through a timestream.
pub trait Component: Serde + Send + Sync + 'static {
    const KIND: ComponentKind;
    const NAME: &'static str;
    const CATEGORY: ComponentCategory = ComponentCategory::Local;
}

pub(crate) trait ErasedComponent: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_boxed(&self) -> Box<dyn ErasedComponent>;
    fn write(&self, writer: &mut dyn BitWrite);
    fn category(&self) -> ComponentCategory;
}

impl<C: Component> ErasedComponent for C {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn ErasedComponent> {
        Box::new(self.clone())
    }

    fn write(&self, writer: &mut dyn BitWrite) {
        self.ser(writer);
    }

    fn category(&self) -> ComponentCategory {
        C::CATEGORY
    }
}

impl Clone for Box<dyn ErasedComponent> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}
