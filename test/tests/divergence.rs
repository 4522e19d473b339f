use std::{sync::Arc, time::Duration};

use intercession_server::{
    cosmos::history::{encode_arrival, encode_departure},
    BehaviorRegistry, CausalChain, ComponentRegistry, Cosmos, Departure, DepartureCheck,
    DivergenceTracker, ParallelCosmosContext, SerializationFilter, Signature, Transform,
};
use intercession_shared::{
    EntityTimestreamMap, EventKind, Message, TemporalEntity, TimejumpConditions, TimesliceId,
    TimestampedMessage, TripId, Vec3,
};
use intercession_test::init_logger;

const ORIGINAL_TRIP: TripId = 0x99;
const WAIT: Duration = Duration::from_secs(5);

fn entity() -> TemporalEntity {
    TemporalEntity::compose(TimesliceId::new(0), 3)
}

#[test]
fn far_departure_diverges_and_caches_override() {
    let mut tracker = DivergenceTracker::new();
    tracker.record_original(entity(), TimejumpConditions::new(ORIGINAL_TRIP, Vec3::ZERO));

    let replayed = TimejumpConditions::new(7, Vec3::new(5.0, 5.0, 5.0));
    let state = Message::new(EventKind::JumpArrival);
    assert_eq!(
        tracker.check_departure(entity(), &replayed, &state),
        DepartureCheck::Divergent {
            original: TimejumpConditions::new(ORIGINAL_TRIP, Vec3::ZERO)
        }
    );
    assert!(tracker.is_divergent(ORIGINAL_TRIP));
    assert!(tracker.take_divergent_state(ORIGINAL_TRIP).is_some());
}

#[test]
fn near_departure_is_congruent() {
    let mut tracker = DivergenceTracker::new();
    tracker.record_original(entity(), TimejumpConditions::new(ORIGINAL_TRIP, Vec3::ZERO));

    let replayed = TimejumpConditions::new(7, Vec3::new(0.1, 0.0, 0.0));
    let state = Message::new(EventKind::JumpArrival);
    assert_eq!(
        tracker.check_departure(entity(), &replayed, &state),
        DepartureCheck::Congruent
    );
    assert!(!tracker.is_divergent(ORIGINAL_TRIP));
}

// Seeds a parallel with an entity about to jump from `replay_origin` while
// history says it departed from the origin and came back at the origin.
fn replay_jump(replay_origin: Vec3) -> (ParallelCosmosContext, Arc<ComponentRegistry>) {
    init_logger();
    let registry = Arc::new(ComponentRegistry::with_builtin_components().unwrap());
    let mut source = Cosmos::new(TimesliceId::new(0), registry.clone());
    source.register_entity(entity());
    source.add_component(entity(), Transform::at(replay_origin)).unwrap();
    source.add_component(entity(), CausalChain::new(2)).unwrap();
    source.request_timejump(entity(), TimesliceId::new(1)).unwrap();
    source.set_coherency(40);

    let mut historical = Cosmos::new(TimesliceId::new(0), registry.clone());
    historical.register_entity(entity());
    historical.add_component(entity(), Transform::default()).unwrap();
    historical.add_component(entity(), CausalChain::new(2)).unwrap();
    let mut components = Message::new(EventKind::JumpArrival);
    historical
        .serialize_entity_components(entity(), Signature::ALL, &mut components, SerializationFilter::All)
        .unwrap();
    let original = Departure {
        entity: entity(),
        destination: TimesliceId::new(0),
        conditions: TimejumpConditions::new(ORIGINAL_TRIP, Vec3::ZERO),
        causal_link: Some(2),
        components,
    };

    let timestream = Arc::new(EntityTimestreamMap::new());
    timestream.push_to_timestream(
        entity(),
        TimestampedMessage::new(41, encode_departure(&original.conditions)),
    );
    timestream.push_to_timestream(
        entity(),
        TimestampedMessage::new(42, encode_arrival(&original, Some(2))),
    );

    let context = ParallelCosmosContext::new("divergence", Arc::new(BehaviorRegistry::new()), 1.0);
    context.init(&source, &[entity()], &[], &timestream, 43).unwrap();
    context.start().unwrap();
    assert!(context.wait_for_halt(WAIT));
    (context, registry)
}

fn extracted_position(context: &ParallelCosmosContext, registry: Arc<ComponentRegistry>) -> Vec3 {
    let mut out = Message::new(EventKind::EntityUpdate);
    context.extract_entity(entity(), &mut out).unwrap();
    let mut destination = Cosmos::new(TimesliceId::new(1), registry);
    destination.register_entity(entity());
    destination
        .deserialize_entity_components(entity(), Signature::ALL, &mut out, SerializationFilter::All)
        .unwrap();
    destination.get_component::<Transform>(entity()).unwrap().position
}

#[test]
fn divergent_replay_overrides_the_historical_arrival() {
    let (context, registry) = replay_jump(Vec3::new(5.0, 5.0, 5.0));

    let mut event = context.pop_event().expect("divergence event");
    assert_eq!(event.kind(), EventKind::Divergence);
    assert_eq!(event.pop::<TemporalEntity>().unwrap(), entity());
    assert_eq!(event.pop::<TripId>().unwrap(), ORIGINAL_TRIP);
    assert!(context.pop_event().is_none());

    assert_eq!(extracted_position(&context, registry), Vec3::new(5.0, 5.0, 5.0));
    assert_eq!(context.forked_entities(), vec![entity()]);
    assert_eq!(context.missing_departures(), 0);
}

#[test]
fn congruent_replay_keeps_the_historical_arrival() {
    let (context, registry) = replay_jump(Vec3::new(0.1, 0.0, 0.0));

    assert!(context.pop_event().is_none());
    assert_eq!(extracted_position(&context, registry), Vec3::ZERO);
}

#[test]
fn departure_without_history_is_counted_missing() {
    init_logger();
    let registry = Arc::new(ComponentRegistry::with_builtin_components().unwrap());
    let mut source = Cosmos::new(TimesliceId::new(0), registry);
    source.register_entity(entity());
    source.add_component(entity(), Transform::default()).unwrap();
    source.request_timejump(entity(), TimesliceId::new(1)).unwrap();

    let context = ParallelCosmosContext::new("missing", Arc::new(BehaviorRegistry::new()), 1.0);
    let timestream = Arc::new(EntityTimestreamMap::new());
    context.init(&source, &[entity()], &[], &timestream, 2).unwrap();
    context.start().unwrap();
    assert!(context.wait_for_halt(WAIT));

    assert_eq!(context.missing_departures(), 1);
    assert!(context.pop_event().is_none());
}
