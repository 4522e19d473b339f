use std::collections::BTreeSet;

use log::{debug, info, warn};

use intercession_shared::{
    Coherency, EventKind, SpacetimeComponent, TemporalEntity, TimelineConfig,
};

use super::RelayConfig;
use crate::{
    cosmos::{CausalChain, Cosmos, SerializationFilter, Signature},
    ParallelError, RelayError, TimelineApi, TimelineError,
};

/// What one call to [`SuperpositionRelay::engage`] did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EngageReport {
    /// A future parallel run was seeded with this frame's candidates
    pub started_forward_resolution: bool,
    /// Entities promoted to superposition by the past parallel
    pub intercepted: Vec<TemporalEntity>,
    /// Entities written back from a synchronized past parallel
    pub extracted: Vec<TemporalEntity>,
    /// Entities whose extraction was refused because a future parallel is
    /// resolving them
    pub deferred: Vec<TemporalEntity>,
}

/// Collects forked entities each frame and drives both halves of
/// superposition resolution: forward, by seeding the future parallel, and
/// backward, by consuming the past parallel once it catches up.
///
/// Call [`submit`](Self::submit) for every entity, then
/// [`engage`](Self::engage) once, then [`clear`](Self::clear).
pub struct SuperpositionRelay {
    min_ticks: u16,
    max_ticks: u16,
    candidates: Vec<TemporalEntity>,
    non_candidates: Vec<TemporalEntity>,
    resolution_needed: bool,
    last_coherency: Coherency,
    // Entities that diverged in the past parallel, forked again once it is
    // extracted.
    divergent: BTreeSet<TemporalEntity>,
}

impl SuperpositionRelay {
    pub fn new(config: RelayConfig, timeline: &TimelineConfig) -> Result<Self, RelayError> {
        config.validate()?;
        Ok(Self {
            min_ticks: timeline.ticks_for_secs(config.forked_threshold_min_secs),
            max_ticks: timeline.ticks_for_secs(config.forked_threshold_max_secs),
            candidates: Vec::new(),
            non_candidates: Vec::new(),
            resolution_needed: false,
            last_coherency: 0,
            divergent: BTreeSet::new(),
        })
    }

    pub fn forked_threshold_min_ticks(&self) -> u16 {
        self.min_ticks
    }

    pub fn forked_threshold_max_ticks(&self) -> u16 {
        self.max_ticks
    }

    /// Sorts a forked entity into candidates or non-candidates by how long
    /// it has been forked. Merged and superposed entities are ignored.
    pub fn submit(&mut self, entity: TemporalEntity, spacetime: &SpacetimeComponent, now: Coherency) {
        self.last_coherency = now;
        if !spacetime.is_forked() {
            return;
        }

        let elapsed = spacetime.elapsed(now);
        if elapsed < self.min_ticks {
            self.non_candidates.push(entity);
            return;
        }
        self.candidates.push(entity);
        if elapsed >= self.max_ticks {
            if !self.resolution_needed {
                debug!("{:?} forked for {} ticks, resolution needed", entity, elapsed);
            }
            self.resolution_needed = true;
        }
    }

    pub fn candidates(&self) -> &[TemporalEntity] {
        &self.candidates
    }

    pub fn non_candidates(&self) -> &[TemporalEntity] {
        &self.non_candidates
    }

    pub fn resolution_needed(&self) -> bool {
        self.resolution_needed
    }

    /// Coherency of the most recent submission, kept across frames
    pub fn last_coherency(&self) -> Coherency {
        self.last_coherency
    }

    pub fn engage(&mut self, cosmos: &mut Cosmos, timeline: &TimelineApi) -> Result<EngageReport, TimelineError> {
        let mut report = EngageReport::default();
        self.resolve_forward(cosmos, timeline, &mut report)?;
        self.resolve_backward(cosmos, timeline, &mut report)?;
        Ok(report)
    }

    fn resolve_forward(
        &mut self,
        cosmos: &mut Cosmos,
        timeline: &TimelineApi,
        report: &mut EngageReport,
    ) -> Result<(), TimelineError> {
        if !self.resolution_needed || !timeline.has_future() || !timeline.future_parallel_is_closed() {
            return Ok(());
        }
        if !timeline.future_parallel_init_and_start(cosmos, &self.candidates, &self.non_candidates)? {
            return Ok(());
        }

        for entity in &self.candidates {
            cosmos.merge_entity(*entity)?;
            if let Some(timestream) = timeline.future_timestream() {
                timestream.clear(*entity);
            }
        }
        report.started_forward_resolution = true;
        Ok(())
    }

    fn resolve_backward(
        &mut self,
        cosmos: &mut Cosmos,
        timeline: &TimelineApi,
        report: &mut EngageReport,
    ) -> Result<(), TimelineError> {
        if !timeline.has_past() || timeline.past_parallel_is_closed() {
            return Ok(());
        }

        for entity in timeline.past_parallel_take_unseen_forked() {
            if !cosmos.has_entity(entity) {
                debug!("{:?} forked in the past parallel but is not here yet", entity);
                continue;
            }
            cosmos.raise_event(entity, EventKind::TimestreamInterception)?;
            report.intercepted.push(entity);
        }

        while let Some(mut event) = timeline.past_parallel_pop_event() {
            if event.kind() != EventKind::Divergence {
                warn!("relay ignoring a {:?} event from the past parallel", event.kind());
                continue;
            }
            let entity: TemporalEntity = event.pop()?;
            if cosmos.has_entity(entity) {
                cosmos.raise_event(entity, EventKind::Divergence)?;
            }
            self.divergent.insert(entity);
        }

        let local = cosmos.get_coherency();
        let synchronized =
            !timeline.past_parallel_is_running() && timeline.past_parallel_get_current_coherency() == local;
        if !synchronized {
            timeline.past_parallel_set_target_coherency(local.wrapping_add(1))?;
            return Ok(());
        }

        for entity in timeline.past_parallel_get_forked_entities() {
            if timeline.future_parallel_is_tracking(entity) {
                warn!(
                    "{:?} is being resolved by the future parallel, leaving it in superposition",
                    entity
                );
                report.deferred.push(entity);
                continue;
            }
            if self.extract(cosmos, timeline, entity)? {
                report.extracted.push(entity);
            }
        }

        for entity in std::mem::take(&mut self.divergent) {
            if cosmos.has_entity(entity) {
                cosmos.raise_event(entity, EventKind::Divergence)?;
            }
        }

        timeline.past_parallel_close()?;
        info!(
            "timeslice {} resolved {} entities from its past at {}",
            timeline.id(),
            report.extracted.len(),
            local
        );
        Ok(())
    }

    // Returns false if the entity no longer exists in either cosmos.
    fn extract(
        &self,
        cosmos: &mut Cosmos,
        timeline: &TimelineApi,
        entity: TemporalEntity,
    ) -> Result<bool, TimelineError> {
        let mut message = match timeline.past_parallel_extract_entity(entity) {
            Ok(message) => message,
            Err(TimelineError::Parallel(ParallelError::EntityNotTracked { .. })) => {
                if cosmos.has_entity(entity) {
                    debug!("{:?} was removed in the past parallel", entity);
                    cosmos.condemn_entity(entity);
                }
                return Ok(false);
            }
            Err(error) => return Err(error),
        };

        cosmos.register_entity(entity);
        cosmos.deserialize_entity_components(
            entity,
            Signature::ALL,
            &mut message,
            SerializationFilter::All,
        )?;
        if let Some(chain) = cosmos.get_component_mut::<CausalChain>(entity) {
            chain.decrement();
        }
        cosmos.merge_entity(entity)?;
        Ok(true)
    }

    /// Drops this frame's candidates and the resolution flag
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.non_candidates.clear();
        self.resolution_needed = false;
    }
}
