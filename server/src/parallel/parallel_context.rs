use std::{
    collections::{BTreeSet, HashSet},
    sync::{
        atomic::{AtomicU16, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};

use intercession_shared::{
    coherency_less_than, Coherency, EntityTimestreamMap, EventKind, Message, TemporalEntity,
    TsBreakpointQueue, TsQueue,
};

use super::{
    divergence::{DepartureCheck, DivergenceTracker},
    task::{SimulationTask, TaskSignals},
};
use crate::{
    cosmos::{
        history::{self, Replayed},
        BehaviorRegistry, CausalChain, Cosmos, SerializationFilter, Signature,
    },
    ParallelError,
};

// Handles shared between the context and the thread running its cosmos.
#[derive(Clone)]
struct SharedHandles {
    target: Arc<AtomicU16>,
    forked: Arc<TsBreakpointQueue<TemporalEntity>>,
    events: Arc<TsQueue<Message>>,
    behaviors: Arc<BehaviorRegistry>,
    delta_secs: f32,
}

/// A seeded cosmos together with everything it needs to step itself.
/// Owned by the simulation thread while running, and by the context while
/// halted.
struct ParallelRun {
    cosmos: Cosmos,
    timestream: Arc<EntityTimestreamMap>,
    tracker: DivergenceTracker,
    forked_seen: HashSet<TemporalEntity>,
    handles: SharedHandles,
}

impl ParallelRun {
    fn run(mut self, signals: TaskSignals) -> ParallelRun {
        loop {
            if signals.stop_requested() {
                debug!("parallel cosmos stopped at {}", self.cosmos.get_coherency());
                break;
            }
            let target = self.handles.target.load(Ordering::Acquire);
            if !coherency_less_than(self.cosmos.get_coherency(), target) {
                debug!("parallel cosmos halted at target {}", target);
                break;
            }
            if let Err(error) = self.step() {
                warn!(
                    "parallel cosmos halted at {} after an error: {}",
                    self.cosmos.get_coherency(),
                    error
                );
                break;
            }
        }
        self
    }

    fn step(&mut self) -> Result<(), ParallelError> {
        let now = self.cosmos.increment_coherency();
        self.replay_timestream(now)?;
        self.cosmos
            .fixed_update(&self.handles.behaviors, self.handles.delta_secs)?;
        self.check_departures();
        self.publish_forked();

        // nothing downstream of a parallel run reads these
        self.cosmos.take_created();
        self.cosmos.take_removed();
        self.cosmos.take_upstream_dirty();
        Ok(())
    }

    fn replay_timestream(&mut self, now: Coherency) -> Result<(), ParallelError> {
        for entity in self.timestream.get_entities_with_streams() {
            while let Some(stamped) = self.timestream.pop_from_timestream(entity, now) {
                match history::apply_timestream_message(&mut self.cosmos, entity, stamped)? {
                    Replayed::Departure(conditions) => {
                        self.tracker.record_original(entity, conditions)
                    }
                    Replayed::Arrival(message) => self.replay_arrival(message)?,
                    Replayed::Applied | Replayed::Skipped => {}
                }
            }
        }
        Ok(())
    }

    fn replay_arrival(&mut self, mut message: Message) -> Result<(), ParallelError> {
        message.rewind();
        let header = history::read_arrival_header(&mut message)?;
        let trip_id = header.conditions.trip_id;

        match self.tracker.take_divergent_state(trip_id) {
            Some(mut divergent) => {
                divergent.rewind();
                history::restore_arrival(&mut self.cosmos, &header, &mut divergent)?;
                self.cosmos.fork_entity(header.entity)?;
                info!(
                    "{:?} arrived on divergent trip {}, overriding it with the replayed departure",
                    header.entity, trip_id
                );
            }
            None => history::restore_arrival(&mut self.cosmos, &header, &mut message)?,
        }
        Ok(())
    }

    fn check_departures(&mut self) {
        for departure in self.cosmos.take_departures() {
            let check = self.tracker.check_departure(
                departure.entity,
                &departure.conditions,
                &departure.components,
            );
            if let DepartureCheck::Divergent { original } = check {
                let mut event = Message::new(EventKind::Divergence);
                event.push(&departure.entity).push(&original.trip_id);
                self.handles.events.push_back(event);
            }
        }
    }

    fn publish_forked(&mut self) {
        for entity in self.cosmos.take_newly_forked() {
            if self.forked_seen.insert(entity) {
                self.handles.forked.push_back(entity);
            }
        }
    }
}

struct ContextState {
    task: Option<SimulationTask<ParallelRun>>,
    halted: Option<ParallelRun>,
    source_timestream: Option<Arc<EntityTimestreamMap>>,
    candidates: BTreeSet<TemporalEntity>,
}

impl ContextState {
    // Joins a task whose thread has exited, keeping its run as the halted one.
    fn reap(&mut self) {
        let finished = self
            .task
            .as_ref()
            .map(|task| !task.is_running() && task.is_finished())
            .unwrap_or(false);
        if !finished {
            return;
        }
        if let Some(task) = self.task.take() {
            match task.join() {
                Ok(run) => self.halted = Some(run),
                Err(error) => warn!("discarding parallel cosmos run: {}", error),
            }
        }
    }
}

/// A headless cosmos re-simulating a fragment of history on its own thread.
///
/// The context is seeded with [`init`](Self::init), started, and then runs
/// until its cosmos reaches the target coherency. The target may be pushed
/// forward at any time, restarting a halted run. Once halted at its target
/// the end state can be extracted. [`close`](Self::close) joins the thread
/// and discards the run so the context can be seeded again.
pub struct ParallelCosmosContext {
    name: String,
    handles: SharedHandles,
    state: Mutex<ContextState>,
}

impl ParallelCosmosContext {
    pub fn new(name: impl Into<String>, behaviors: Arc<BehaviorRegistry>, delta_secs: f32) -> Self {
        Self {
            name: name.into(),
            handles: SharedHandles {
                target: Arc::new(AtomicU16::new(0)),
                forked: Arc::new(TsBreakpointQueue::new()),
                events: Arc::new(TsQueue::new()),
                behaviors,
                delta_secs,
            },
            state: Mutex::new(ContextState {
                task: None,
                halted: None,
                source_timestream: None,
                candidates: BTreeSet::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, ContextState> {
        let mut state = self.state.lock();
        state.reap();
        state
    }

    /// Seeds the context with a copy of `source`.
    ///
    /// Every entity is copied except those whose causal chain link is 0,
    /// which have no future to resolve. `candidates` and `non_candidates` are
    /// always copied, but only candidates are tracked for extraction.
    /// The replayed timestream is a fork of `timestream`, which stays linked
    /// to it until the context is closed.
    pub fn init(
        &self,
        source: &Cosmos,
        candidates: &[TemporalEntity],
        non_candidates: &[TemporalEntity],
        timestream: &Arc<EntityTimestreamMap>,
        target: Coherency,
    ) -> Result<(), ParallelError> {
        let mut state = self.lock();
        if state.task.is_some() || state.halted.is_some() {
            warn!("{} cannot be seeded before it is closed", self.name);
            return Err(ParallelError::NotClosed);
        }

        let cosmos = source.seed_copy(|entity, cosmos| {
            candidates.contains(&entity)
                || non_candidates.contains(&entity)
                || cosmos.causal_link(entity) != Some(0)
        });

        let forked = &self.handles.forked;
        forked.clear();
        forked.set_breakpoint_at_begin();
        let mut forked_seen = HashSet::new();
        for entity in candidates {
            if cosmos.has_entity(*entity) && forked_seen.insert(*entity) {
                forked.push_back(*entity);
            }
        }
        self.handles.events.clear();
        self.handles.target.store(target, Ordering::Release);

        info!(
            "{} seeded at {} with {} entities ({} candidates), target {}",
            self.name,
            cosmos.get_coherency(),
            cosmos.entity_count(),
            forked_seen.len(),
            target
        );

        state.halted = Some(ParallelRun {
            cosmos,
            timestream: EntityTimestreamMap::fork(timestream),
            tracker: DivergenceTracker::new(),
            forked_seen,
            handles: self.handles.clone(),
        });
        state.source_timestream = Some(timestream.clone());
        state.candidates = candidates.iter().copied().collect();
        Ok(())
    }

    /// Starts the simulation thread. Starting a running context does nothing.
    pub fn start(&self) -> Result<(), ParallelError> {
        let mut state = self.lock();
        self.start_locked(&mut state)
    }

    fn start_locked(&self, state: &mut ContextState) -> Result<(), ParallelError> {
        if state.task.is_some() {
            return Ok(());
        }
        let run = state.halted.take().ok_or(ParallelError::NotInitialized)?;
        debug!(
            "{} running from {} to {}",
            self.name,
            run.cosmos.get_coherency(),
            self.target_coherency()
        );
        let task = SimulationTask::spawn(self.name.clone(), move |signals| run.run(signals))?;
        state.task = Some(task);
        Ok(())
    }

    /// Moves the target and restarts a halted run toward it
    pub fn set_target_coherency(&self, target: Coherency) -> Result<(), ParallelError> {
        self.handles.target.store(target, Ordering::Release);
        let mut state = self.lock();
        if state.halted.is_some() {
            self.start_locked(&mut state)?;
        }
        Ok(())
    }

    pub fn target_coherency(&self) -> Coherency {
        self.handles.target.load(Ordering::Acquire)
    }

    /// Coherency of the halted run. Always 0 while the thread is running.
    pub fn current_coherency(&self) -> Coherency {
        let state = self.lock();
        if state.task.is_some() {
            return 0;
        }
        state
            .halted
            .as_ref()
            .map(|run| run.cosmos.get_coherency())
            .unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.lock().task.is_some()
    }

    /// True iff there is neither a running thread nor a halted run, so the
    /// context may be seeded again
    pub fn is_closed(&self) -> bool {
        let state = self.lock();
        state.task.is_none() && state.halted.is_none()
    }

    /// Blocks until the run halts or `timeout` elapses. Returns whether it
    /// halted.
    pub fn wait_for_halt(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_running() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Stops and joins the thread, discards the run and unlinks the replayed
    /// timestream from its source.
    pub fn close(&self) -> Result<(), ParallelError> {
        let mut state = self.state.lock();
        let joined = match state.task.take() {
            Some(task) => {
                task.request_stop();
                task.join().map(|_| ())
            }
            None => Ok(()),
        };
        state.halted = None;
        state.candidates.clear();
        if let Some(source) = state.source_timestream.take() {
            EntityTimestreamMap::unlink_timestreams(&source);
        }
        self.handles.forked.clear();
        self.handles.forked.set_breakpoint_at_begin();
        self.handles.events.clear();

        info!("{} closed", self.name);
        joined
    }

    /// Every entity that went forked inside the run, in order of appearance
    pub fn forked_entities(&self) -> Vec<TemporalEntity> {
        self.handles.forked.snapshot()
    }

    /// Forked entities appended since the previous call
    pub fn take_unseen_forked(&self) -> Vec<TemporalEntity> {
        let mut unseen = Vec::new();
        while let Some(entity) = self.handles.forked.pop_at_breakpoint() {
            unseen.push(entity);
        }
        unseen
    }

    /// Whether the open run is resolving `entity`
    pub fn is_tracking(&self, entity: TemporalEntity) -> bool {
        let state = self.lock();
        if state.task.is_none() && state.halted.is_none() {
            return false;
        }
        state.candidates.contains(&entity) || self.handles.forked.snapshot().contains(&entity)
    }

    /// Takes the next event the run raised for its owner
    pub fn pop_event(&self) -> Option<Message> {
        self.handles.events.pop_front().map(|(event, _)| event)
    }

    /// Serializes the halted state of one entity into `out`. Fails if the run
    /// stopped short of its target.
    pub fn extract_entity(&self, entity: TemporalEntity, out: &mut Message) -> Result<(), ParallelError> {
        let state = self.lock();
        if state.task.is_some() {
            return Err(ParallelError::StillRunning);
        }
        let run = state.halted.as_ref().ok_or(ParallelError::NotInitialized)?;
        let current = run.cosmos.get_coherency();
        let target = self.target_coherency();
        if coherency_less_than(current, target) {
            return Err(ParallelError::TargetNotReached { current, target });
        }
        if !run.cosmos.has_entity(entity) {
            return Err(ParallelError::EntityNotTracked { entity });
        }
        run.cosmos.serialize_entity_components(
            entity,
            Signature::ALL,
            out,
            SerializationFilter::All,
        )?;
        Ok(())
    }

    /// Copies the final state of every candidate and forked entity into
    /// `destination`, one causal chain link back, and merges them there.
    /// Entities the run removed are condemned. Returns false if the run is
    /// still going or has not reached its target.
    pub fn extract_entity_updates(&self, destination: &mut Cosmos) -> Result<bool, ParallelError> {
        let state = self.lock();
        if state.task.is_some() {
            return Ok(false);
        }
        let Some(run) = state.halted.as_ref() else {
            return Ok(false);
        };
        let target = self.target_coherency();
        if run.cosmos.get_coherency() != target {
            debug!(
                "{} not extracted, halted at {} short of {}",
                self.name,
                run.cosmos.get_coherency(),
                target
            );
            return Ok(false);
        }

        let mut extracted: Vec<TemporalEntity> = state.candidates.iter().copied().collect();
        for entity in self.handles.forked.snapshot() {
            if !extracted.contains(&entity) {
                extracted.push(entity);
            }
        }

        for entity in &extracted {
            let entity = *entity;
            if !run.cosmos.has_entity(entity) {
                if destination.has_entity(entity) {
                    destination.condemn_entity(entity);
                }
                continue;
            }
            let mut message = Message::new(EventKind::EntityUpdate);
            run.cosmos.serialize_entity_components(
                entity,
                Signature::ALL,
                &mut message,
                SerializationFilter::All,
            )?;
            destination.register_entity(entity);
            destination.deserialize_entity_components(
                entity,
                Signature::ALL,
                &mut message,
                SerializationFilter::All,
            )?;
            if let Some(chain) = destination.get_component_mut::<CausalChain>(entity) {
                chain.decrement();
            }
            destination.merge_entity(entity)?;
        }

        info!(
            "{} extracted {} entities at {}",
            self.name,
            extracted.len(),
            destination.get_coherency()
        );
        Ok(true)
    }

    /// Failed departures the halted run could not match against history
    pub fn missing_departures(&self) -> usize {
        self.lock()
            .halted
            .as_ref()
            .map(|run| run.tracker.missing_departures())
            .unwrap_or(0)
    }
}

impl Drop for ParallelCosmosContext {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().task.take() {
            task.request_stop();
            if task.join().is_err() {
                warn!("{} thread panicked while shutting down", self.name);
            }
        }
    }
}
