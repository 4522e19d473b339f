use std::sync::Arc;

use log::{debug, info, warn};

use intercession_shared::{
    Coherency, EntityTimestreamMap, EventKind, Message, Multiplex, TemporalEntity, TimelineConfig,
    TimesliceId,
};

use crate::{cosmos::Cosmos, ParallelCosmosContext, ParallelError, TimelineError};

/// A timestream map together with the parallel context that replays it.
///
/// The future link of timeslice `n` and the past link of timeslice `n + 1`
/// share both halves.
#[derive(Clone)]
pub struct TimelineLink {
    pub timestream: Arc<EntityTimestreamMap>,
    pub parallel: Arc<ParallelCosmosContext>,
}

impl TimelineLink {
    pub fn new(timestream: Arc<EntityTimestreamMap>, parallel: Arc<ParallelCosmosContext>) -> Self {
        Self {
            timestream,
            parallel,
        }
    }
}

/// The facade a timeslice uses to reach its neighbours: point-to-point
/// messages through the shared [`Multiplex`], and the lifecycle of the
/// parallel runs on its past and future links.
pub struct TimelineApi {
    config: TimelineConfig,
    id: TimesliceId,
    multiplex: Arc<Multiplex>,
    past: Option<TimelineLink>,
    future: Option<TimelineLink>,
}

impl TimelineApi {
    /// Fails if `id` has no inbox in `multiplex`
    pub fn new(
        config: TimelineConfig,
        id: TimesliceId,
        multiplex: Arc<Multiplex>,
    ) -> Result<Self, TimelineError> {
        if !multiplex.contains(id) {
            return Err(TimelineError::UnknownTimeslice {
                id,
                num_timeslices: multiplex.len(),
            });
        }
        Ok(Self {
            config,
            id,
            multiplex,
            past: None,
            future: None,
        })
    }

    pub fn with_past(mut self, link: TimelineLink) -> Self {
        self.past = Some(link);
        self
    }

    pub fn with_future(mut self, link: TimelineLink) -> Self {
        self.future = Some(link);
        self
    }

    pub fn id(&self) -> TimesliceId {
        self.id
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    pub fn has_past(&self) -> bool {
        self.past.is_some()
    }

    pub fn has_future(&self) -> bool {
        self.future.is_some()
    }

    pub fn past_timestream(&self) -> Option<&Arc<EntityTimestreamMap>> {
        self.past.as_ref().map(|link| &link.timestream)
    }

    pub fn future_timestream(&self) -> Option<&Arc<EntityTimestreamMap>> {
        self.future.as_ref().map(|link| &link.timestream)
    }

    // Messaging

    /// Queues `message` in the inbox of `destination`
    pub fn send_message(&self, destination: TimesliceId, message: Message) -> Result<usize, TimelineError> {
        if destination == self.id {
            warn!("timeslice {} is sending a {:?} message to itself", self.id, message.kind());
        }
        Ok(self.multiplex.send(destination, message)?)
    }

    /// Takes the oldest message from this timeslice's own inbox
    pub fn pop_message(&self) -> Option<Message> {
        self.multiplex.pop(self.id)
    }

    pub fn is_message_available(&self) -> bool {
        self.multiplex.is_message_available(self.id)
    }

    // Future parallel

    /// Seeds the future parallel from `source` and starts it toward the
    /// coherency the future timeslice has reached. Returns false without
    /// doing anything if there is no future link or its parallel is still
    /// open.
    pub fn future_parallel_init_and_start(
        &self,
        source: &Cosmos,
        candidates: &[TemporalEntity],
        non_candidates: &[TemporalEntity],
    ) -> Result<bool, TimelineError> {
        let Some(future) = &self.future else {
            warn!("timeslice {} has no future link to resolve into", self.id);
            return Ok(false);
        };
        if !future.parallel.is_closed() {
            debug!("timeslice {} future parallel is still open", self.id);
            return Ok(false);
        }

        let target = source
            .get_coherency()
            .wrapping_add(1)
            .wrapping_add(self.config.timeslice_delay_ticks());
        future
            .parallel
            .init(source, candidates, non_candidates, &future.timestream, target)?;
        future.parallel.start()?;
        info!(
            "timeslice {} started forward resolution of {} entities, {} -> {}",
            self.id,
            candidates.len(),
            source.get_coherency(),
            target
        );

        if let Some(destination) = self.id.future().filter(|id| self.multiplex.contains(*id)) {
            let mut notice = Message::new(EventKind::ParallelInit);
            notice.push(&source.get_coherency()).push(&target);
            self.send_message(destination, notice)?;
        }
        Ok(true)
    }

    /// True if there is no future link, or its parallel is neither running
    /// nor waiting to be joined
    pub fn future_parallel_is_closed(&self) -> bool {
        self.future
            .as_ref()
            .map(|link| link.parallel.is_closed())
            .unwrap_or(true)
    }

    /// Whether the open future parallel is resolving `entity`
    pub fn future_parallel_is_tracking(&self, entity: TemporalEntity) -> bool {
        self.future
            .as_ref()
            .map(|link| link.parallel.is_tracking(entity))
            .unwrap_or(false)
    }

    // Past parallel

    fn past_parallel(&self) -> Result<&Arc<ParallelCosmosContext>, ParallelError> {
        self.past
            .as_ref()
            .map(|link| &link.parallel)
            .ok_or(ParallelError::NotInitialized)
    }

    /// Stops and joins the past parallel, then tells the past timeslice its
    /// run has been consumed
    pub fn past_parallel_close(&self) -> Result<(), TimelineError> {
        let Some(past) = &self.past else {
            warn!("timeslice {} has no past parallel to close", self.id);
            return Ok(());
        };
        past.parallel.close()?;

        if let Some(destination) = self.id.past().filter(|id| self.multiplex.contains(*id)) {
            self.send_message(destination, Message::new(EventKind::ParallelFinished))?;
        }
        Ok(())
    }

    /// True if there is no past link, or its parallel is closed
    pub fn past_parallel_is_closed(&self) -> bool {
        self.past
            .as_ref()
            .map(|link| link.parallel.is_closed())
            .unwrap_or(true)
    }

    /// Moves the past parallel's target, restarting it if it had halted
    pub fn past_parallel_set_target_coherency(&self, target: Coherency) -> Result<(), TimelineError> {
        self.past_parallel()?.set_target_coherency(target)?;
        Ok(())
    }

    pub fn past_parallel_is_running(&self) -> bool {
        self.past
            .as_ref()
            .map(|link| link.parallel.is_running())
            .unwrap_or(false)
    }

    /// 0 while the past parallel is running, or if there is none
    pub fn past_parallel_get_current_coherency(&self) -> Coherency {
        self.past
            .as_ref()
            .map(|link| link.parallel.current_coherency())
            .unwrap_or(0)
    }

    pub fn past_parallel_get_forked_entities(&self) -> Vec<TemporalEntity> {
        self.past
            .as_ref()
            .map(|link| link.parallel.forked_entities())
            .unwrap_or_default()
    }

    /// Forked entities the past parallel reported since the previous call
    pub fn past_parallel_take_unseen_forked(&self) -> Vec<TemporalEntity> {
        self.past
            .as_ref()
            .map(|link| link.parallel.take_unseen_forked())
            .unwrap_or_default()
    }

    /// Serializes one entity's halted state from the past parallel
    pub fn past_parallel_extract_entity(&self, entity: TemporalEntity) -> Result<Message, TimelineError> {
        let mut message = Message::new(EventKind::EntityUpdate);
        self.past_parallel()?.extract_entity(entity, &mut message)?;
        Ok(message)
    }

    pub fn past_parallel_pop_event(&self) -> Option<Message> {
        self.past.as_ref().and_then(|link| link.parallel.pop_event())
    }
}
