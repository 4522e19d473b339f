use std::sync::Arc;

use intercession_server::{
    BehaviorRegistry, ComponentRegistry, Cosmos, ParallelCosmosContext, RelayConfig,
    SuperpositionRelay, TimelineApi, TimelineLink, Timeslice,
};
use intercession_shared::{EntityTimestreamMap, Multiplex, TimelineConfig};

/// Fluent builder for a chain of timeslices sharing one multiplex, each
/// future link also being the next timeslice's past link
pub struct TestTimelineBuilder {
    config: TimelineConfig,
    relay: RelayConfig,
    behaviors: BehaviorRegistry,
}

impl TestTimelineBuilder {
    pub fn new() -> Self {
        Self {
            config: TimelineConfig::default(),
            relay: RelayConfig::default(),
            behaviors: BehaviorRegistry::new(),
        }
    }

    pub fn timeslices(mut self, count: u8) -> Self {
        self.config.num_timeslices = count;
        self
    }

    pub fn delay_secs(mut self, secs: f32) -> Self {
        self.config.timeslice_delay_secs = secs;
        self
    }

    pub fn relay(mut self, relay: RelayConfig) -> Self {
        self.relay = relay;
        self
    }

    pub fn behaviors(mut self, behaviors: BehaviorRegistry) -> Self {
        self.behaviors = behaviors;
        self
    }

    pub fn build(self) -> TestTimeline {
        self.config.validate().expect("invalid test timeline config");
        let multiplex = Arc::new(Multiplex::new(self.config.num_timeslices));
        let registry = Arc::new(
            ComponentRegistry::with_builtin_components().expect("builtin components collide"),
        );
        let behaviors = Arc::new(self.behaviors);
        let delta_secs = self.config.fixed_timestep().as_secs_f32();

        let links: Vec<TimelineLink> = (1..self.config.num_timeslices)
            .map(|future| {
                TimelineLink::new(
                    Arc::new(EntityTimestreamMap::new()),
                    Arc::new(ParallelCosmosContext::new(
                        format!("parallel {}->{}", future - 1, future),
                        behaviors.clone(),
                        delta_secs,
                    )),
                )
            })
            .collect();

        let timeslices = self
            .config
            .timeslice_ids()
            .map(|id| {
                let index = usize::from(id.value());
                let mut timeline = TimelineApi::new(self.config.clone(), id, multiplex.clone())
                    .expect("timeslice id outside the multiplex");
                if let Some(past) = index.checked_sub(1).and_then(|past| links.get(past)) {
                    timeline = timeline.with_past(past.clone());
                }
                if let Some(future) = links.get(index) {
                    timeline = timeline.with_future(future.clone());
                }
                let relay = SuperpositionRelay::new(self.relay.clone(), &self.config)
                    .expect("invalid relay config");
                Timeslice::new(timeline, Cosmos::new(id, registry.clone()), behaviors.clone(), relay)
            })
            .collect();

        TestTimeline {
            config: self.config,
            multiplex,
            links,
            timeslices,
        }
    }
}

impl Default for TestTimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A built chain of timeslices, ticked by hand
pub struct TestTimeline {
    pub config: TimelineConfig,
    pub multiplex: Arc<Multiplex>,
    /// `links[n]` joins timeslice `n` to timeslice `n + 1`
    pub links: Vec<TimelineLink>,
    pub timeslices: Vec<Timeslice>,
}

impl TestTimeline {
    pub fn timeslice(&mut self, id: u8) -> &mut Timeslice {
        &mut self.timeslices[usize::from(id)]
    }

    pub fn link(&self, past: u8) -> &TimelineLink {
        &self.links[usize::from(past)]
    }
}
