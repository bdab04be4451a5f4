use crate::cache::object::{CacheObjectArena, IntrusiveList};

use super::EvictionPolicy;

/// Plain recency-order LRU: one intrusive queue, head = most recently
/// accessed, tail = the eviction candidate.
#[derive(Default)]
pub struct LruPolicy {
    queue: IntrusiveList,
}

impl LruPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn on_insert(&mut self, arena: &mut CacheObjectArena, idx: u32, _vtime: i64) {
        self.queue.push_front(arena, idx);
    }

    fn on_access(&mut self, arena: &mut CacheObjectArena, idx: u32, _vtime: i64) {
        self.queue.move_to_front(arena, idx);
    }

    fn on_evict(&mut self, arena: &mut CacheObjectArena, idx: u32, _vtime: i64) {
        self.queue.unlink(arena, idx);
    }

    fn pick_victim(&self, _arena: &CacheObjectArena, _vtime: i64) -> Option<u32> {
        self.queue.tail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object::CacheObject;

    #[test]
    fn scenario_lru_reduced_to_tail_eviction() {
        let mut arena = CacheObjectArena::new();
        let mut policy = LruPolicy::new();
        let mut idx_of = std::collections::HashMap::new();
        let mut vtime = 0i64;

        let mut resident: Vec<u64> = Vec::new();
        let capacity = 3usize;
        let mut misses = 0u32;

        for id in [1u64, 2, 3, 1, 4] {
            vtime += 1;
            if let Some(&idx) = idx_of.get(&id) {
                policy.on_access(&mut arena, idx, vtime);
            } else {
                misses += 1;
                if resident.len() == capacity {
                    let victim_idx = policy.pick_victim(&arena, vtime).unwrap();
                    let victim_id = arena.get(victim_idx).obj_id;
                    policy.on_evict(&mut arena, victim_idx, vtime);
                    arena.remove(victim_idx);
                    idx_of.remove(&victim_id);
                    resident.retain(|&r| r != victim_id);
                }
                let idx = arena.insert(CacheObject::new(id, 1, vtime));
                policy.on_insert(&mut arena, idx, vtime);
                idx_of.insert(id, idx);
                resident.push(id);
            }
        }

        assert_eq!(misses, 4);
        let mut resident_sorted = resident.clone();
        resident_sorted.sort();
        assert_eq!(resident_sorted, vec![1, 3, 4]);
    }
}
