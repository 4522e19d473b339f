use intercession_serde::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

use super::MessageError;

/// Type tag carried in every message header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EventKind {
    /// Upstream component state of an entity for one tick
    EntityUpdate = 1,
    EntityCreated,
    EntityRemoved,
    /// Forces the target entity straight into superposition
    TimestreamInterception,
    /// Fingerprint of a timejump departure, recorded in the timestream
    JumpDeparture,
    /// A jumping entity's full state, delivered to the destination timeslice
    JumpArrival,
    /// A replayed departure disagreed with history
    Divergence,
    /// A future parallel run started, seeded from the sender's present
    ParallelInit,
    /// A past parallel run was extracted and closed
    ParallelFinished,
}

impl EventKind {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for EventKind {
    type Error = MessageError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        let kind = match tag {
            1 => Self::EntityUpdate,
            2 => Self::EntityCreated,
            3 => Self::EntityRemoved,
            4 => Self::TimestreamInterception,
            5 => Self::JumpDeparture,
            6 => Self::JumpArrival,
            7 => Self::Divergence,
            8 => Self::ParallelInit,
            9 => Self::ParallelFinished,
            _ => return Err(MessageError::UnknownKind { tag }),
        };
        Ok(kind)
    }
}

impl Serde for EventKind {
    fn ser(&self, writer: &mut dyn BitWrite) {
        self.tag().ser(writer);
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let tag = u8::de(reader)?;
        Self::try_from(tag).map_err(|_| SerdeErr::InvalidValue {
            type_name: "EventKind",
        })
    }
}

impl ConstBitLength for EventKind {
    fn const_bit_length() -> u32 {
        u8::const_bit_length()
    }
}
