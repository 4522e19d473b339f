use std::time::Duration;

use intercession_server::{CausalChain, Transform, Velocity};
use intercession_shared::{SpacetimeComponent, TimestreamState, Vec3};
use intercession_test::{assert_timestream_state, init_logger, TestTimelineBuilder};

const WAIT: Duration = Duration::from_secs(5);
const FORKED_AT: u16 = 100;

#[test]
fn forked_entity_is_resolved_through_the_future_timeslice() {
    init_logger();
    let mut timeline = TestTimelineBuilder::new()
        .timeslices(2)
        .delay_secs(0.05)
        .build();
    let max_ticks = timeline.timeslice(0).relay().forked_threshold_max_ticks();
    let delay_ticks = timeline.config.timeslice_delay_ticks();
    assert_eq!(delay_ticks, 3);

    let entity = {
        let mut cosmos = timeline.timeslice(0).cosmos().lock();
        cosmos.set_coherency(FORKED_AT);
        let entity = cosmos.create_entity().unwrap();
        cosmos.add_component(entity, Transform::default()).unwrap();
        cosmos
            .add_component(entity, Velocity::new(Vec3::new(1.0, 0.0, 0.0)))
            .unwrap();
        cosmos.add_component(entity, CausalChain::new(2)).unwrap();
        cosmos.fork_entity(entity).unwrap();
        entity
    };
    timeline
        .timeslice(1)
        .cosmos()
        .lock()
        .set_coherency(FORKED_AT + max_ticks);

    // Forward resolution starts on exactly the tick the threshold is crossed
    for tick in 1..=max_ticks {
        let report = timeline.timeslice(0).tick().unwrap();
        assert_eq!(
            report.started_forward_resolution,
            tick == max_ticks,
            "forward resolution state wrong on tick {}",
            tick
        );
    }
    let started_at = FORKED_AT + max_ticks;
    {
        let cosmos = timeline.timeslice(0).cosmos().lock();
        assert_timestream_state!(cosmos, entity, TimestreamState::Merged);
    }
    assert!(timeline.timeslice(0).timeline().future_parallel_is_tracking(entity));

    let parallel = timeline.link(0).parallel.clone();
    assert_eq!(parallel.target_coherency(), started_at + 1 + delay_ticks);

    // The future timeslice drives the past parallel until it is in step
    let mut extracted_at = None;
    for _ in 0..16 {
        assert!(parallel.wait_for_halt(WAIT), "past parallel never halted");
        let report = timeline.timeslice(1).tick().unwrap();
        if report.extracted.contains(&entity) {
            extracted_at = Some(timeline.timeslice(1).cosmos().lock().get_coherency());
            break;
        }
    }
    let extracted_at = extracted_at.expect("entity was never extracted");
    assert_eq!(extracted_at, started_at + 1 + delay_ticks);
    assert!(parallel.is_closed());

    {
        let cosmos = timeline.timeslice(1).cosmos().lock();
        assert_timestream_state!(cosmos, entity, TimestreamState::Merged);
        assert_eq!(
            cosmos.get_component::<SpacetimeComponent>(entity).unwrap().state_coherency(),
            extracted_at
        );
        assert_eq!(cosmos.causal_link(entity), Some(1));
        assert!(cosmos.get_component::<Transform>(entity).unwrap().position.x > 2.0);
    }

    // The past timeslice hears that its run was consumed
    assert!(timeline.timeslice(0).timeline().is_message_available());
    timeline.timeslice(0).tick().unwrap();
    assert!(timeline.timeslice(0).timeline().future_parallel_is_closed());
}

#[test]
fn young_forks_are_carried_as_non_candidates() {
    init_logger();
    let mut timeline = TestTimelineBuilder::new().timeslices(2).build();

    let (old, young) = {
        let mut cosmos = timeline.timeslice(0).cosmos().lock();
        let old = cosmos.create_entity().unwrap();
        cosmos.fork_entity(old).unwrap();
        cosmos.set_coherency(100);
        let young = cosmos.create_entity().unwrap();
        cosmos.fork_entity(young).unwrap();
        cosmos.set_coherency(119);
        (old, young)
    };

    let report = timeline.timeslice(0).tick().unwrap();
    assert!(report.started_forward_resolution);

    let cosmos = timeline.timeslice(0).cosmos().lock();
    assert_timestream_state!(cosmos, old, TimestreamState::Merged);
    assert_timestream_state!(cosmos, young, TimestreamState::Forked);
    drop(cosmos);

    let api = timeline.timeslice(0).timeline();
    assert!(api.future_parallel_is_tracking(old));
    assert!(!api.future_parallel_is_tracking(young));
}
