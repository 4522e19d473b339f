use crate::Coherency;

const HALF_RANGE: u16 = 32768;

/// Returns whether coherency `a` is strictly ahead of `b`, tolerating
/// wraparound of the 16-bit counter.
/// coherency_greater_than(2, 1) == true
/// coherency_greater_than(2, 65534) == true
/// coherency_greater_than(1, 1) == false
pub fn coherency_greater_than(a: Coherency, b: Coherency) -> bool {
    ((a > b) && (a - b <= HALF_RANGE)) || ((a < b) && (b - a > HALF_RANGE))
}

pub fn coherency_less_than(a: Coherency, b: Coherency) -> bool {
    coherency_greater_than(b, a)
}

/// Wraparound-safe `a >= b`. This is the comparison every timestream gate uses.
pub fn coherency_greater_or_equal(a: Coherency, b: Coherency) -> bool {
    a == b || coherency_greater_than(a, b)
}

/// Signed number of ticks from `from` to `to`.
///
/// # Examples
/// ```
/// # use intercession_shared::coherency_diff;
/// assert_eq!(coherency_diff(1, 2), 1);
/// assert_eq!(coherency_diff(2, 1), -1);
/// assert_eq!(coherency_diff(65535, 0), 1);
/// assert_eq!(coherency_diff(0, 65535), -1);
/// ```
pub fn coherency_diff(from: Coherency, to: Coherency) -> i16 {
    // two's complement reinterpretation gives the shortest signed distance
    to.wrapping_sub(from) as i16
}

/// Ticks elapsed since `since`, zero if `since` lies in the future.
pub fn coherency_elapsed(now: Coherency, since: Coherency) -> u16 {
    let diff = coherency_diff(since, now);
    if diff < 0 {
        0
    } else {
        diff as u16
    }
}
