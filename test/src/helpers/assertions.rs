/// Assert that an entity of a locked cosmos is in the given timestream state
#[macro_export]
macro_rules! assert_timestream_state {
    ($cosmos:expr, $entity:expr, $state:expr) => {
        assert_eq!(
            $cosmos.timestream_state($entity),
            $state,
            "Entity {:?} is in the wrong timestream state",
            $entity
        );
    };
}
