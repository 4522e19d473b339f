use std::{sync::Arc, thread};

use intercession_shared::{
    EntityTimestreamMap, EventKind, Message, TemporalEntity, TimesliceId, TimestampedMessage,
};

fn entity() -> TemporalEntity {
    TemporalEntity::compose(TimesliceId::new(1), 7)
}

fn update(value: u32) -> TimestampedMessage {
    let mut message = Message::new(EventKind::EntityUpdate);
    message.push(&value);
    TimestampedMessage::new(1, message)
}

#[test]
fn linked_pushes_fan_out_until_unlinked() {
    let source = Arc::new(EntityTimestreamMap::new());
    let linked = Arc::new(EntityTimestreamMap::new());

    EntityTimestreamMap::link_timestreams(&source, &linked);
    source.push_to_timestream(entity(), update(42));

    let mut observed = linked.pop_from_timestream(entity(), 1).unwrap();
    assert_eq!(observed.message.pop::<u32>().unwrap(), 42);
    assert_eq!(source.stream_len(entity()), 1);

    EntityTimestreamMap::unlink_timestreams(&source);
    source.push_to_timestream(entity(), update(43));
    assert!(linked.pop_from_timestream(entity(), 1).is_none());
    assert_eq!(source.stream_len(entity()), 2);
}

#[test]
fn unlinking_twice_is_harmless() {
    let map = EntityTimestreamMap::new();
    EntityTimestreamMap::unlink_timestreams(&map);
    EntityTimestreamMap::unlink_timestreams(&map);
    assert!(!map.is_linked());
}

#[test]
fn dropped_link_target_is_ignored() {
    let source = Arc::new(EntityTimestreamMap::new());
    {
        let linked = Arc::new(EntityTimestreamMap::new());
        EntityTimestreamMap::link_timestreams(&source, &linked);
        assert!(source.is_linked());
    }
    assert!(!source.is_linked());
    source.push_to_timestream(entity(), update(1));
    assert_eq!(source.stream_len(entity()), 1);
}

#[test]
fn fork_sees_backlog_and_live_pushes_once() {
    let source = Arc::new(EntityTimestreamMap::new());
    source.push_to_timestream(entity(), update(1));

    let fork = EntityTimestreamMap::fork(&source);
    source.push_to_timestream(entity(), update(2));

    let values: Vec<u32> = std::iter::from_fn(|| fork.pop_from_timestream(entity(), 1))
        .map(|mut stamped| stamped.message.pop::<u32>().unwrap())
        .collect();
    assert_eq!(values, vec![1, 2]);
}

#[test]
fn crosswise_links_from_many_threads_do_not_deadlock() {
    let a = Arc::new(EntityTimestreamMap::new());
    let b = Arc::new(EntityTimestreamMap::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let (a, b) = (a.clone(), b.clone());
            thread::spawn(move || {
                for _ in 0..200 {
                    if i % 2 == 0 {
                        EntityTimestreamMap::link_timestreams(&a, &b);
                        a.push_to_timestream(entity(), update(i));
                    } else {
                        EntityTimestreamMap::link_timestreams(&b, &a);
                        b.push_to_timestream(entity(), update(i));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(a.stream_len(entity()) >= 800);
    assert!(b.stream_len(entity()) >= 800);
}
