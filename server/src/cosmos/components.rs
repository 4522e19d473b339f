use intercession_shared::{
    BitReader, BitWrite, CausalChainLink, Serde, SerdeErr, SpacetimeComponent, TimesliceId,
    TripId, Vec3,
};

use super::{BehaviorTag, Component, ComponentCategory, ComponentKind};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Transform {
    pub position: Vec3,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self { position }
    }
}

impl Serde for Transform {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.position.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            position: Vec3::de(reader)?,
        })
    }
}

impl Component for Transform {
    const KIND: ComponentKind = ComponentKind::new(0);
    const NAME: &'static str = "Transform";
}

/// Linear velocity. Driven by input from outside the timeslice, so it is the
/// state an `ENTITY_UPDATE` carries forward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub linear: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self { linear }
    }
}

impl Serde for Velocity {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.linear.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            linear: Vec3::de(reader)?,
        })
    }
}

impl Component for Velocity {
    const KIND: ComponentKind = ComponentKind::new(1);
    const NAME: &'static str = "Velocity";
    const CATEGORY: ComponentCategory = ComponentCategory::Upstream;
}

impl Component for SpacetimeComponent {
    const KIND: ComponentKind = ComponentKind::new(2);
    const NAME: &'static str = "Spacetime";
}

/// Which incarnation of its entity this copy is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CausalChain {
    pub link: CausalChainLink,
}

impl CausalChain {
    /// Link given to entities created in their host timeslice
    pub const GENESIS_LINK: CausalChainLink = 1;

    pub fn new(link: CausalChainLink) -> Self {
        Self { link }
    }

    pub fn decrement(&mut self) {
        self.link = self.link.saturating_sub(1);
    }

    pub fn increment(&mut self) {
        self.link = self.link.saturating_add(1);
    }
}

impl Default for CausalChain {
    fn default() -> Self {
        Self::new(Self::GENESIS_LINK)
    }
}

impl Serde for CausalChain {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.link.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            link: CausalChainLink::de(reader)?,
        })
    }
}

impl Component for CausalChain {
    const KIND: ComponentKind = ComponentKind::new(3);
    const NAME: &'static str = "CausalChain";
}

/// A timejump requested for the next fixed update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timejump {
    pub trip_id: TripId,
    pub destination: TimesliceId,
}

impl Serde for Timejump {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.trip_id.ser(writer);
        self.destination.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            trip_id: TripId::de(reader)?,
            destination: TimesliceId::de(reader)?,
        })
    }
}

impl Component for Timejump {
    const KIND: ComponentKind = ComponentKind::new(4);
    const NAME: &'static str = "Timejump";
}

/// Attaches a registered behavior to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Behavior {
    pub tag: BehaviorTag,
}

impl Behavior {
    pub fn new(tag: BehaviorTag) -> Self {
        Self { tag }
    }
}

impl Serde for Behavior {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.tag.ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            tag: BehaviorTag::de(reader)?,
        })
    }
}

impl Component for Behavior {
    const KIND: ComponentKind = ComponentKind::new(5);
    const NAME: &'static str = "Behavior";
}
