use std::{sync::Arc, time::Duration};

use intercession_server::{
    Behavior, BehaviorRegistry, CausalChain, ComponentRegistry, Cosmos, ParallelCosmosContext,
    ParallelError, Transform, Velocity,
};
use intercession_shared::{
    EntityTimestreamMap, EventKind, Message, TemporalEntity, TimesliceId, TimestampedMessage,
    Vec3,
};
use intercession_test::{init_logger, sample_behaviors, ACCELERATE, SELF_DESTRUCT};

const WAIT: Duration = Duration::from_secs(5);

fn seeded_cosmos(coherency: u16) -> (Cosmos, TemporalEntity) {
    let registry = Arc::new(ComponentRegistry::with_builtin_components().unwrap());
    let mut cosmos = Cosmos::new(TimesliceId::new(0), registry);
    let entity = cosmos.create_entity().unwrap();
    cosmos.add_component(entity, Transform::default()).unwrap();
    cosmos.add_component(entity, Velocity::default()).unwrap();
    cosmos.add_component(entity, Behavior::new(ACCELERATE)).unwrap();
    cosmos.add_component(entity, CausalChain::default()).unwrap();
    cosmos.set_coherency(coherency);
    (cosmos, entity)
}

fn context() -> ParallelCosmosContext {
    ParallelCosmosContext::new("convergence", Arc::new(sample_behaviors()), 1.0)
}

fn run_to(context: &ParallelCosmosContext, cosmos: &Cosmos, entity: TemporalEntity, target: u16) {
    let timestream = Arc::new(EntityTimestreamMap::new());
    context.init(cosmos, &[entity], &[], &timestream, target).unwrap();
    context.start().unwrap();
    assert!(context.wait_for_halt(WAIT), "parallel cosmos never halted");
}

#[test]
fn halts_at_target_without_overshooting() {
    init_logger();
    for start in [0u16, 100, 4000] {
        let (cosmos, entity) = seeded_cosmos(start);
        let context = context();
        run_to(&context, &cosmos, entity, start + 3);

        assert_eq!(context.current_coherency(), start + 3);
        assert!(!context.is_running());
        assert!(!context.is_closed());
        context.close().unwrap();
    }
}

#[test]
fn target_across_the_wrap_is_reached() {
    init_logger();
    let (cosmos, entity) = seeded_cosmos(65534);
    let context = context();
    run_to(&context, &cosmos, entity, 1);
    assert_eq!(context.current_coherency(), 1);
}

#[test]
fn behaviors_run_inside_the_parallel() {
    init_logger();
    let (cosmos, entity) = seeded_cosmos(10);
    let context = context();
    run_to(&context, &cosmos, entity, 13);

    let mut out = Message::new(EventKind::EntityUpdate);
    context.extract_entity(entity, &mut out).unwrap();

    let registry = cosmos.registry().clone();
    let mut destination = Cosmos::new(TimesliceId::new(1), registry);
    destination.register_entity(entity);
    destination
        .deserialize_entity_components(
            entity,
            intercession_server::Signature::ALL,
            &mut out,
            intercession_server::SerializationFilter::All,
        )
        .unwrap();

    // velocity 1, 2, 3 integrated over three one-second ticks
    assert_eq!(destination.get_component::<Velocity>(entity).unwrap().linear.x, 3.0);
    assert_eq!(
        destination.get_component::<Transform>(entity).unwrap().position,
        Vec3::new(6.0, 0.0, 0.0)
    );
}

#[test]
fn timestream_backlog_is_replayed_before_simulation() {
    init_logger();
    let (cosmos, entity) = seeded_cosmos(20);
    let timestream = Arc::new(EntityTimestreamMap::new());

    let removal = Message::new(EventKind::EntityRemoved);
    timestream.push_to_timestream(entity, TimestampedMessage::new(22, removal));

    let context = context();
    context.init(&cosmos, &[entity], &[], &timestream, 23).unwrap();
    context.start().unwrap();
    assert!(context.wait_for_halt(WAIT));

    let mut out = Message::new(EventKind::EntityUpdate);
    assert_eq!(
        context.extract_entity(entity, &mut out),
        Err(ParallelError::EntityNotTracked { entity })
    );

    let registry = cosmos.registry().clone();
    let mut destination = Cosmos::new(TimesliceId::new(1), registry);
    destination.register_entity(entity);
    assert_eq!(context.extract_entity_updates(&mut destination), Ok(true));
    destination.flush_condemned();
    assert!(!destination.has_entity(entity));
}

#[test]
fn non_candidates_are_simulated_but_not_tracked() {
    init_logger();
    let (mut cosmos, entity) = seeded_cosmos(30);
    let doomed = cosmos.create_entity().unwrap();
    cosmos.add_component(doomed, Behavior::new(SELF_DESTRUCT)).unwrap();

    let context = context();
    let timestream = Arc::new(EntityTimestreamMap::new());
    context
        .init(&cosmos, &[entity], &[doomed], &timestream, 32)
        .unwrap();
    assert!(!context.is_tracking(doomed));
    context.start().unwrap();
    assert!(context.wait_for_halt(WAIT));

    assert_eq!(context.forked_entities(), vec![entity]);
    let mut out = Message::new(EventKind::EntityUpdate);
    assert!(context.extract_entity(doomed, &mut out).is_err());
}

#[test]
fn restart_requires_close() {
    init_logger();
    let (cosmos, entity) = seeded_cosmos(0);
    let context = context();
    run_to(&context, &cosmos, entity, 2);

    let timestream = Arc::new(EntityTimestreamMap::new());
    assert_eq!(
        context.init(&cosmos, &[entity], &[], &timestream, 5),
        Err(ParallelError::NotClosed)
    );
    context.close().unwrap();
    assert!(context.is_closed());
    assert_eq!(context.start(), Err(ParallelError::NotInitialized));
}

#[test]
fn behaviors_registry_is_optional() {
    let (cosmos, entity) = seeded_cosmos(0);
    let context = ParallelCosmosContext::new("bare", Arc::new(BehaviorRegistry::new()), 1.0);
    run_to(&context, &cosmos, entity, 1);
    assert_eq!(context.current_coherency(), 1);
}
