//! End-to-end scenarios exercising the cache shell against the built-in
//! policies, independent of the trace reader.

use cachesim::admission::{AlwaysAdmit, NeverAdmit};
use cachesim::policy::{FrequencyLfuPolicy, LruPolicy};
use cachesim::request::Request;
use cachesim::Cache;

fn req(id: u64, size: u32) -> Request {
    Request {
        obj_id: id,
        obj_size: size,
        ..Default::default()
    }
}

/// Scenario 1: LRU reduced to tail eviction. Capacity 3, `ignore_obj_size`,
/// access sequence `1,2,3,1,4`. Expected residents `{1,4,3}`, 4 misses.
#[test]
fn lru_reduced_to_tail_eviction() {
    let mut cache = Cache::with_overhead(3, Box::new(LruPolicy::new()), Box::new(AlwaysAdmit), 0);
    let mut misses = 0u32;
    for id in [1u64, 2, 3, 1, 4] {
        if !cache.get(&req(id, 1)).unwrap() {
            misses += 1;
        }
    }
    assert_eq!(misses, 4);
    assert_eq!(cache.n_resident(), 3);
}

/// Scenario 2: frequency-node LFU. Capacity 3, sequence `1,1,2,2,3,3,4`.
/// Victim on inserting 4 is object 1 (earliest promoted to frequency 2).
#[test]
fn frequency_node_lfu_evicts_earliest_promoted() {
    let mut cache = Cache::with_overhead(
        3,
        Box::new(FrequencyLfuPolicy::new()),
        Box::new(AlwaysAdmit),
        0,
    );
    let mut misses = 0u32;
    for id in [1u64, 1, 2, 2, 3, 3, 4] {
        if !cache.get(&req(id, 1)).unwrap() {
            misses += 1;
        }
    }
    assert_eq!(misses, 4);
    assert_eq!(cache.n_resident(), 3);
}

/// Scenario 6: eviction when full. Capacity 100 bytes (metadata overhead
/// disabled), three 40-byte inserts evict exactly one object.
#[test]
fn eviction_when_full_bounds_occupancy() {
    let mut cache = Cache::with_overhead(100, Box::new(LruPolicy::new()), Box::new(AlwaysAdmit), 0);
    for id in [1u64, 2, 3] {
        cache.get(&req(id, 40)).unwrap();
    }
    assert_eq!(cache.n_resident(), 2);
    assert!(cache.occupied_bytes() >= 40 && cache.occupied_bytes() <= 80);
}

/// Admission gating law: if `admission.admit` always returns false, miss
/// ratio is 1.0 and nothing is ever resident.
#[test]
fn admission_never_admits_keeps_cache_empty() {
    let mut cache = Cache::new(1_000, Box::new(LruPolicy::new()), Box::new(NeverAdmit));
    let mut misses = 0u32;
    for id in 0..20u64 {
        if !cache.get(&req(id, 10)).unwrap() {
            misses += 1;
        }
    }
    assert_eq!(misses, 20);
    assert_eq!(cache.n_resident(), 0);
}

/// Invariant I3: resident count tracks the hash index and intrusive queue
/// through a mix of hits, misses, and explicit removals.
#[test]
fn resident_count_matches_inserts_minus_evictions_and_removals() {
    let mut cache = Cache::with_overhead(1_000, Box::new(LruPolicy::new()), Box::new(AlwaysAdmit), 0);
    for id in 0..5u64 {
        cache.get(&req(id, 10)).unwrap();
    }
    assert_eq!(cache.n_resident(), 5);
    assert!(cache.remove(2));
    assert_eq!(cache.n_resident(), 4);
    assert!(!cache.remove(2));
    cache.get(&req(0, 10)).unwrap();
    assert_eq!(cache.n_resident(), 4);
}

/// A single-capacity frequency-node cache replaying `A, A, B` must still
/// evict `A` to admit `B` on the third request rather than aborting: `A`'s
/// promotion off frequency-1 (after the second access) must leave
/// `min_freq` pointing at `A`'s actual bucket, not stranded on an empty
/// bucket 1.
#[test]
fn frequency_node_lfu_single_capacity_survives_promotion_then_eviction() {
    let mut cache = Cache::with_overhead(
        1,
        Box::new(FrequencyLfuPolicy::new()),
        Box::new(AlwaysAdmit),
        0,
    );
    assert!(!cache.get(&req(1, 1)).unwrap()); // miss: insert A
    assert!(cache.get(&req(1, 1)).unwrap()); // hit: promote A to freq 2
    assert!(!cache.get(&req(2, 1)).unwrap()); // miss: evict A, insert B
    assert_eq!(cache.n_resident(), 1);
}
