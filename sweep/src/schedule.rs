//! The core counts a sweep visits.

use std::cmp;
use std::collections::BTreeSet;

/// Core counts are sampled densely up to this count.
pub const DENSE_LIMIT: usize = 10;

/// Largest step between sparse core counts.
pub const MAX_STEP: usize = 4;

/// Every count from 1 to `min(DENSE_LIMIT, max)`, then counts growing by
/// `min(MAX_STEP, count)`, then `max` itself. Strictly increasing.
pub fn core_counts(max: usize) -> Vec<usize> {
    let max = cmp::max(max, 1);
    let mut counts = (1..cmp::min(DENSE_LIMIT, max) + 1).collect::<BTreeSet<_>>();
    let mut count = 1;
    while count <= max {
        counts.insert(count);
        count += cmp::min(MAX_STEP, count);
    }
    counts.insert(max);
    counts.into_iter().collect()
}

/// The schedule for this machine, optionally capped.
pub fn for_machine(cpus: usize, cap: Option<usize>) -> Vec<usize> {
    let max = match cap {
        Some(cap) => cmp::min(cap, cpus),
        None => cpus,
    };
    core_counts(max)
}
