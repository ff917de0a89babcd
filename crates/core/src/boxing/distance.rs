//! Communication-cost metric between locations.
//!
//! The metric only ranks candidates; correctness never depends on the exact
//! values. It must however induce a reproducible total order, so ties are
//! broken explicitly (lower machine id, then lower device index, then lower
//! parallel id) rather than left to iteration order.

use crate::placement::{Location, Placement};

/// Source and destination share a memory zone.
pub const SAME_ZONE: u64 = 0;
/// Same machine, different memory zone (host<->device or device<->device).
pub const SAME_MACHINE: u64 = 1;
/// Different machines; the transfer crosses the network.
pub const CROSS_MACHINE: u64 = 2;

/// Cost of moving one value from `src` to `dst`. Symmetric; zero iff the
/// two locations address the same memory zone.
pub fn distance(src: Location, dst: Location) -> u64 {
    if src.machine_id != dst.machine_id {
        CROSS_MACHINE
    } else if src.mem_zone() == dst.mem_zone() {
        SAME_ZONE
    } else {
        SAME_MACHINE
    }
}

/// Parallel id of the placement entry closest to `target`.
///
/// Candidates are ordered by `(distance, machine_id, device_index)`; the
/// lowest parallel id wins remaining ties.
pub fn nearest_parallel_id(placement: &Placement, target: Location) -> usize {
    let mut best = 0;
    let mut best_key = rank_key(placement.location(0), target);
    for (parallel_id, &loc) in placement.locations().iter().enumerate().skip(1) {
        let key = rank_key(loc, target);
        if key < best_key {
            best = parallel_id;
            best_key = key;
        }
    }
    best
}

fn rank_key(candidate: Location, target: Location) -> (u64, u32, u32) {
    (
        distance(candidate, target),
        candidate.machine_id,
        candidate.device_index,
    )
}
