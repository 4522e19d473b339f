use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Instant,
};

use log::{debug, error, info, trace, warn};
use parking_lot::Mutex;

use intercession_shared::{
    Coherency, EventKind, Message, TemporalEntity, TimestampedMessage,
};

use crate::{
    cosmos::{
        history::{self, Replayed},
        BehaviorRegistry, Cosmos, Departure,
    },
    relay::{EngageReport, SuperpositionRelay},
    synchro::SpacetimeSynchro,
    TimelineApi, TimelineError,
};

/// One authoritative simulation: a cosmos, the timeline facade linking it
/// to its neighbours, and the synchro resolving its forked entities.
pub struct Timeslice {
    cosmos: Arc<Mutex<Cosmos>>,
    timeline: TimelineApi,
    behaviors: Arc<BehaviorRegistry>,
    synchro: SpacetimeSynchro,
    delta_secs: f32,
}

impl Timeslice {
    pub fn new(
        timeline: TimelineApi,
        cosmos: Cosmos,
        behaviors: Arc<BehaviorRegistry>,
        relay: SuperpositionRelay,
    ) -> Self {
        let delta_secs = timeline.config().fixed_timestep().as_secs_f32();
        let cosmos = Arc::new(Mutex::new(cosmos));
        let synchro = SpacetimeSynchro::new(&cosmos, relay);
        Self {
            cosmos,
            timeline,
            behaviors,
            synchro,
            delta_secs,
        }
    }

    pub fn cosmos(&self) -> &Arc<Mutex<Cosmos>> {
        &self.cosmos
    }

    pub fn timeline(&self) -> &TimelineApi {
        &self.timeline
    }

    pub fn relay(&self) -> &SuperpositionRelay {
        self.synchro.relay()
    }

    /// Advances the timeslice by one fixed update
    pub fn tick(&mut self) -> Result<EngageReport, TimelineError> {
        {
            let mut cosmos = self.cosmos.lock();

            let mut arrivals = Vec::new();
            while let Some(message) = self.timeline.pop_message() {
                if let Some(arrival) = self.receive(&mut cosmos, message)? {
                    arrivals.push(arrival);
                }
            }

            let now = cosmos.increment_coherency();
            self.consume_past_timestream(&mut cosmos, now)?;
            cosmos.fixed_update(&self.behaviors, self.delta_secs)?;
            self.produce_future_timestream(&mut cosmos, now, arrivals)?;
        }

        self.synchro.update(&self.timeline)
    }

    fn receive(
        &self,
        cosmos: &mut Cosmos,
        mut message: Message,
    ) -> Result<Option<(TemporalEntity, Message)>, TimelineError> {
        match message.kind() {
            EventKind::JumpArrival => {
                let header = history::apply_arrival(cosmos, &mut message)?;
                debug!(
                    "timeslice {} received {:?} on trip {}",
                    self.timeline.id(),
                    header.entity,
                    header.conditions.trip_id
                );
                Ok(Some((header.entity, message)))
            }
            EventKind::ParallelInit => {
                let source: Coherency = message.pop()?;
                let target: Coherency = message.pop()?;
                info!(
                    "timeslice {} past parallel started from {} toward {}",
                    self.timeline.id(),
                    source,
                    target
                );
                Ok(None)
            }
            EventKind::ParallelFinished => {
                info!("timeslice {} future parallel was consumed", self.timeline.id());
                Ok(None)
            }
            other => {
                warn!("timeslice {} dropping unexpected {:?} message", self.timeline.id(), other);
                Ok(None)
            }
        }
    }

    fn consume_past_timestream(&self, cosmos: &mut Cosmos, now: Coherency) -> Result<(), TimelineError> {
        let Some(past) = self.timeline.past_timestream() else {
            return Ok(());
        };
        for entity in past.get_entities_with_streams() {
            while let Some(stamped) = past.pop_from_timestream(entity, now) {
                match history::apply_timestream_message(cosmos, entity, stamped)? {
                    Replayed::Departure(conditions) => {
                        trace!("{:?} departed on trip {} in the past", entity, conditions.trip_id)
                    }
                    Replayed::Arrival(_) => trace!("{:?} arrived in the past", entity),
                    Replayed::Applied | Replayed::Skipped => {}
                }
            }
        }
        Ok(())
    }

    fn produce_future_timestream(
        &self,
        cosmos: &mut Cosmos,
        now: Coherency,
        arrivals: Vec<(TemporalEntity, Message)>,
    ) -> Result<(), TimelineError> {
        let created = cosmos.take_created();
        let removed = cosmos.take_removed();
        let dirty = cosmos.take_upstream_dirty();
        let departures = cosmos.take_departures();
        cosmos.take_newly_forked();

        if let Some(future) = self.timeline.future_timestream() {
            let push = |entity, message| future.push_to_timestream(entity, TimestampedMessage::new(now, message));

            for entity in created.iter().copied().filter(|entity| cosmos.has_entity(*entity)) {
                push(entity, history::encode_entity_created(cosmos, entity)?);
            }
            for entity in &removed {
                push(*entity, history::encode_entity_removed());
            }
            for entity in dirty.into_iter().filter(|entity| cosmos.has_entity(*entity)) {
                if created.contains(&entity) {
                    continue;
                }
                push(entity, history::encode_entity_update(cosmos, entity)?);
            }
            for departure in &departures {
                push(departure.entity, history::encode_departure(&departure.conditions));
            }
            for (entity, arrival) in arrivals {
                push(entity, arrival);
            }
        }

        for departure in &departures {
            self.send_timejump(cosmos, departure);
        }
        Ok(())
    }

    /// Sends a departed entity to its destination timeslice, one causal
    /// chain link further into the past or future
    pub fn send_timejump(&self, cosmos: &Cosmos, departure: &Departure) -> bool {
        let here = cosmos.timeslice();
        let causal_link = departure.causal_link.map(|link| {
            if departure.destination < here {
                link.saturating_sub(1)
            } else if departure.destination > here {
                link.saturating_add(1)
            } else {
                link
            }
        });

        let arrival = history::encode_arrival(departure, causal_link);
        match self.timeline.send_message(departure.destination, arrival) {
            Ok(_) => {
                debug!(
                    "{:?} jumped from timeslice {} to {} on trip {}",
                    departure.entity, here, departure.destination, departure.conditions.trip_id
                );
                true
            }
            Err(error) => {
                warn!("{:?} lost on trip {}: {}", departure.entity, departure.conditions.trip_id, error);
                false
            }
        }
    }

    /// Ticks at the simulation rate until `stop` is set. An error halts this
    /// timeslice only and is returned to the caller.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), TimelineError> {
        let timestep = self.timeline.config().fixed_timestep();
        info!("timeslice {} running", self.timeline.id());

        while !stop.load(Ordering::Acquire) {
            let started = Instant::now();
            if let Err(halt) = self.tick() {
                error!("timeslice {} halted: {}", self.timeline.id(), halt);
                return Err(halt);
            }
            if let Some(remaining) = timestep.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }

        info!("timeslice {} stopped", self.timeline.id());
        Ok(())
    }
}
