use crate::{messages::Message, types::Coherency};

/// A message stamped with the sender's coherency at the time it was pushed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimestampedMessage {
    pub coherency: Coherency,
    pub message: Message,
}

impl TimestampedMessage {
    pub fn new(coherency: Coherency, message: Message) -> Self {
        Self { coherency, message }
    }

    /// Whether a receiver at `current` may act on this message yet
    pub fn is_due(&self, current: Coherency) -> bool {
        crate::coherency::coherency_greater_or_equal(current, self.coherency)
    }
}
