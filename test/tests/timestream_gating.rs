use intercession_shared::{
    EntityTimestreamMap, EventKind, Message, TemporalEntity, TimesliceId, TimestampedMessage,
};
use proptest::prelude::*;

fn entity() -> TemporalEntity {
    TemporalEntity::compose(TimesliceId::new(0), 1)
}

fn stamped(coherency: u16) -> TimestampedMessage {
    let mut message = Message::new(EventKind::EntityUpdate);
    message.push(&coherency);
    TimestampedMessage::new(coherency, message)
}

#[test]
fn only_the_due_front_is_popped() {
    let map = EntityTimestreamMap::new();
    for coherency in [5, 3, 9] {
        map.push_to_timestream(entity(), stamped(coherency));
    }

    assert!(!map.entity_has_data(entity(), 4));
    assert!(map.pop_from_timestream(entity(), 4).is_none());
    assert_eq!(map.stream_len(entity()), 3);

    assert_eq!(map.pop_from_timestream(entity(), 5).map(|m| m.coherency), Some(5));
    assert_eq!(map.pop_from_timestream(entity(), 5).map(|m| m.coherency), Some(3));
    assert!(map.pop_from_timestream(entity(), 5).is_none());

    let drained: Vec<u16> = std::iter::from_fn(|| map.pop_from_timestream(entity(), 10))
        .map(|m| m.coherency)
        .collect();
    assert_eq!(drained, vec![9]);
}

#[test]
fn out_of_order_stamps_drain_in_push_order() {
    let map = EntityTimestreamMap::new();
    for coherency in [5, 3, 9] {
        map.push_to_timestream(entity(), stamped(coherency));
    }

    let drained: Vec<u16> = std::iter::from_fn(|| map.pop_from_timestream(entity(), 10))
        .map(|m| m.coherency)
        .collect();
    assert_eq!(drained, vec![5, 3, 9]);
    assert!(!map.entity_has_data(entity(), 10));
}

#[test]
fn gating_survives_wraparound() {
    let map = EntityTimestreamMap::new();
    map.push_to_timestream(entity(), stamped(2));

    assert!(!map.entity_has_data(entity(), 65534));
    assert!(map.entity_has_data(entity(), 2));
}

#[test]
fn removed_streams_are_recreated_on_push() {
    let map = EntityTimestreamMap::new();
    map.push_to_timestream(entity(), stamped(1));
    map.remove(entity());
    assert!(map.get_entities_with_streams().is_empty());

    map.push_to_timestream(entity(), stamped(2));
    assert_eq!(map.get_entities_with_streams(), vec![entity()]);
}

proptest! {
    #[test]
    fn prop_due_messages_drain_fifo(stamps in prop::collection::vec(0u16..1000, 1..32)) {
        let map = EntityTimestreamMap::new();
        for coherency in &stamps {
            map.push_to_timestream(entity(), stamped(*coherency));
        }

        let drained: Vec<u16> = std::iter::from_fn(|| map.pop_from_timestream(entity(), 1000))
            .map(|m| m.coherency)
            .collect();
        prop_assert_eq!(drained, stamps);
    }

    #[test]
    fn prop_never_pops_ahead_of_current(
        stamps in prop::collection::vec(0u16..1000, 1..32),
        current in 0u16..1000,
    ) {
        let map = EntityTimestreamMap::new();
        for coherency in &stamps {
            map.push_to_timestream(entity(), stamped(*coherency));
        }

        while let Some(popped) = map.pop_from_timestream(entity(), current) {
            prop_assert!(popped.coherency <= current);
        }
        let expected_left = stamps.iter().position(|c| *c > current).map(|i| stamps.len() - i).unwrap_or(0);
        prop_assert_eq!(map.stream_len(entity()), expected_left);
    }
}
