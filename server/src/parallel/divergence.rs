use std::collections::HashMap;

use log::{debug, warn};

use intercession_shared::{Message, TemporalEntity, TimejumpConditions, TripId};

/// Outcome of comparing a replayed departure with history
#[derive(Clone, Debug, PartialEq)]
pub enum DepartureCheck {
    /// History holds no departure for this entity in the current cycle
    Missing,
    /// The replay matches history within tolerance
    Congruent,
    /// The replay differs from `original` beyond tolerance
    Divergent { original: TimejumpConditions },
}

/// Compares timejump departures replayed by a parallel cosmos with the ones
/// that already happened, caching the state of every divergent one.
#[derive(Default)]
pub struct DivergenceTracker {
    original_departures: HashMap<TemporalEntity, TimejumpConditions>,
    divergent_states: HashMap<TripId, Message>,
    missing_departures: usize,
}

impl DivergenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a departure that already happened
    pub fn record_original(&mut self, entity: TemporalEntity, conditions: TimejumpConditions) {
        self.original_departures.insert(entity, conditions);
    }

    pub fn original(&self, entity: TemporalEntity) -> Option<&TimejumpConditions> {
        self.original_departures.get(&entity)
    }

    /// Classifies a replayed departure. A divergent one caches `state` under
    /// the original trip id, so the matching arrival can be overridden.
    pub fn check_departure(
        &mut self,
        entity: TemporalEntity,
        replayed: &TimejumpConditions,
        state: &Message,
    ) -> DepartureCheck {
        let Some(original) = self.original_departures.get(&entity).copied() else {
            self.missing_departures += 1;
            warn!(
                "missing jump departure: {:?} departed on trip {} in replay but history has no departure for it",
                entity, replayed.trip_id
            );
            return DepartureCheck::Missing;
        };

        if original.is_congruent(replayed) {
            debug!("{:?} departure on trip {} is congruent", entity, original.trip_id);
            return DepartureCheck::Congruent;
        }

        debug!(
            "{:?} departure on trip {} diverged: {:?} vs {:?}",
            entity, original.trip_id, original.origin, replayed.origin
        );
        self.divergent_states.insert(original.trip_id, state.clone());
        DepartureCheck::Divergent { original }
    }

    pub fn is_divergent(&self, trip_id: TripId) -> bool {
        self.divergent_states.contains_key(&trip_id)
    }

    /// Takes the cached state that should replace the arrival of `trip_id`
    pub fn take_divergent_state(&mut self, trip_id: TripId) -> Option<Message> {
        self.divergent_states.remove(&trip_id)
    }

    pub fn missing_departures(&self) -> usize {
        self.missing_departures
    }

    pub fn clear(&mut self) {
        self.original_departures.clear();
        self.divergent_states.clear();
        self.missing_departures = 0;
    }
}
