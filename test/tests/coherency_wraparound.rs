/// PROPERTY-BASED TESTS: wraparound-safe coherency comparison
///
/// Key invariants:
/// 1. Comparison agrees with plain integer order for nearby values
/// 2. A value just past the wrap counts as ahead of one near the maximum
/// 3. Elapsed ticks never go negative

use intercession_shared::{
    coherency_diff, coherency_elapsed, coherency_greater_or_equal, coherency_greater_than,
    coherency_less_than,
};
use proptest::prelude::*;

#[test]
fn small_value_is_ahead_of_max() {
    assert!(coherency_greater_or_equal(2, 65534));
    assert!(!coherency_greater_or_equal(65534, 2));
    assert!(coherency_greater_than(0, 65535));
    assert_eq!(coherency_diff(65534, 2), 4);
    assert_eq!(coherency_elapsed(2, 65534), 4);
}

proptest! {
    #[test]
    fn prop_nearby_values_match_integer_order(a in 0u16..30000, d in 0u16..30000) {
        let b = a + d;
        prop_assert!(coherency_greater_or_equal(b, a));
        prop_assert_eq!(coherency_greater_than(b, a), d > 0);
        prop_assert_eq!(coherency_less_than(a, b), d > 0);
    }

    #[test]
    fn prop_forward_steps_stay_ahead_across_wrap(a in any::<u16>(), d in 1u16..32768) {
        let ahead = a.wrapping_add(d);
        prop_assert!(coherency_greater_than(ahead, a));
        prop_assert!(!coherency_greater_or_equal(a, ahead));
        prop_assert_eq!(i32::from(coherency_diff(a, ahead)), i32::from(d));
    }

    #[test]
    fn prop_elapsed_is_zero_for_future_stamps(now in any::<u16>(), d in 1u16..32768) {
        prop_assert_eq!(coherency_elapsed(now, now.wrapping_add(d)), 0);
        prop_assert_eq!(coherency_elapsed(now.wrapping_add(d), now), d);
    }
}
