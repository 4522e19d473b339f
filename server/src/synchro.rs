use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use intercession_shared::SpacetimeComponent;

use crate::{
    cosmos::{Component, Cosmos, Signature},
    relay::{EngageReport, SuperpositionRelay},
    TimelineApi, TimelineError,
};

/// Feeds every spacetime entity of a cosmos through its
/// [`SuperpositionRelay`] once per fixed tick.
///
/// Holds only a weak handle to the cosmos, upgraded for the duration of one
/// update.
pub struct SpacetimeSynchro {
    cosmos: Weak<Mutex<Cosmos>>,
    relay: SuperpositionRelay,
}

impl SpacetimeSynchro {
    pub fn new(cosmos: &Arc<Mutex<Cosmos>>, relay: SuperpositionRelay) -> Self {
        Self {
            cosmos: Arc::downgrade(cosmos),
            relay,
        }
    }

    pub fn relay(&self) -> &SuperpositionRelay {
        &self.relay
    }

    /// Submits, engages and clears the relay
    pub fn update(&mut self, timeline: &TimelineApi) -> Result<EngageReport, TimelineError> {
        let cosmos = self
            .cosmos
            .upgrade()
            .ok_or(TimelineError::CosmosExpired {
                timeslice: timeline.id(),
            })?;
        let mut cosmos = cosmos.lock();

        let now = cosmos.get_coherency();
        let signature = Signature::EMPTY.with(SpacetimeComponent::KIND);
        for entity in cosmos.entities_with(signature) {
            if let Some(spacetime) = cosmos.get_component::<SpacetimeComponent>(entity) {
                self.relay.submit(entity, spacetime, now);
            }
        }

        let report = self.relay.engage(&mut cosmos, timeline);
        self.relay.clear();
        report
    }
}
