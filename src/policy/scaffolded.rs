use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::cache::object::{CacheObjectArena, IntrusiveList};
use crate::config::ScaffoldedDecision;

use super::age_view::AgePercentileView;
use super::decision::{fifo_decision, lfu_decision, lru_decision, DecisionContext, DecisionFn};
use super::history::{EvictedMeta, History};
use super::order_stat::OrderedMultiset;
use super::EvictionPolicy;

/// A policy that maintains rich order-statistics side-structures over the
/// resident set — access-count, size, and insertion-age multisets, plus a
/// bounded history of evicted objects — but delegates the actual eviction
/// *decision* to an externally supplied closure operating over a read-only
/// view of those structures and a window of least-recently-used candidates.
///
/// All mutation (updating the multisets, the history, the per-object delta
/// FIFO) happens in this policy's own `on_insert`/`on_access`/`on_evict`; the
/// decision function never mutates anything.
pub struct ScaffoldedPolicy {
    queue: IntrusiveList,
    deltas: FxHashMap<u32, VecDeque<i64>>,
    delta_capacity: usize,
    counts: OrderedMultiset<u32>,
    sizes: OrderedMultiset<u64>,
    ages: AgePercentileView,
    history: History,
    window_size: usize,
    decision_fn: DecisionFn,
}

impl ScaffoldedPolicy {
    pub fn new(
        window_size: usize,
        history_capacity: usize,
        delta_capacity: usize,
        decision_fn: DecisionFn,
    ) -> Self {
        Self {
            queue: IntrusiveList::new(),
            deltas: FxHashMap::default(),
            delta_capacity: delta_capacity.max(1),
            counts: OrderedMultiset::new(),
            sizes: OrderedMultiset::new(),
            ages: AgePercentileView::new(),
            history: History::new(history_capacity),
            window_size: window_size.max(1),
            decision_fn,
        }
    }

    /// Builds the policy with one of the built-in default decision
    /// functions, used whenever no externally generated heuristic is
    /// supplied.
    pub fn with_default_decision(
        default: ScaffoldedDecision,
        window_size: usize,
        history_capacity: usize,
        delta_capacity: usize,
    ) -> Self {
        let decision_fn: DecisionFn = match default {
            ScaffoldedDecision::Lru => Box::new(lru_decision),
            ScaffoldedDecision::Fifo => Box::new(fifo_decision),
            ScaffoldedDecision::Lfu => Box::new(lfu_decision),
        };
        Self::new(window_size, history_capacity, delta_capacity, decision_fn)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn counts_percentile(&self, p: f64) -> Option<u32> {
        (!self.counts.is_empty()).then(|| self.counts.percentile(p))
    }

    pub fn sizes_percentile(&self, p: f64) -> Option<u64> {
        (!self.sizes.is_empty()).then(|| self.sizes.percentile(p))
    }

    pub fn ages_percentile(&self, p: f64, current_vtime: i64) -> Option<i64> {
        (!self.ages.is_empty()).then(|| self.ages.percentile(p, current_vtime))
    }

    fn window_head(&self, arena: &CacheObjectArena) -> Option<u32> {
        let mut cur = self.queue.tail?;
        for _ in 1..self.window_size {
            match arena.get(cur).prev {
                Some(prev) => cur = prev,
                None => break,
            }
        }
        Some(cur)
    }

    fn push_delta(&mut self, idx: u32, delta: i64) {
        let cap = self.delta_capacity;
        let entry = self.deltas.entry(idx).or_default();
        if entry.len() == cap {
            entry.pop_front();
        }
        entry.push_back(delta);
    }
}

impl EvictionPolicy for ScaffoldedPolicy {
    fn name(&self) -> &'static str {
        "scaffolded"
    }

    fn on_insert(&mut self, arena: &mut CacheObjectArena, idx: u32, _vtime: i64) {
        let obj = arena.get(idx);
        let count = 1u32;
        let size = obj.obj_size;
        let addition_vtime = obj.addition_vtime;
        arena.get_mut(idx).freq = count;
        self.counts.insert(count);
        self.sizes.insert(size);
        self.ages.insert(addition_vtime);
        self.deltas.insert(idx, VecDeque::new());
        self.queue.push_front(arena, idx);
    }

    fn on_access(&mut self, arena: &mut CacheObjectArena, idx: u32, vtime: i64) {
        let (old_count, last_access) = {
            let obj = arena.get(idx);
            (obj.freq, obj.last_access_vtime)
        };
        self.counts.remove_one(old_count);
        let new_count = old_count + 1;
        self.counts.insert(new_count);
        self.push_delta(idx, vtime - last_access);

        let obj = arena.get_mut(idx);
        obj.freq = new_count;
        obj.last_access_vtime = vtime;

        self.queue.move_to_front(arena, idx);
    }

    fn on_evict(&mut self, arena: &mut CacheObjectArena, idx: u32, vtime: i64) {
        let obj = arena.get(idx).clone();
        self.history.push(EvictedMeta {
            obj_id: obj.obj_id,
            count: obj.freq,
            size: obj.obj_size,
            addition_vtime: obj.addition_vtime,
            evicted_at_vtime: vtime,
        });
        self.counts.remove_one(obj.freq);
        self.sizes.remove_one(obj.obj_size);
        self.ages.remove_one(obj.addition_vtime);
        self.deltas.remove(&idx);
        self.queue.unlink(arena, idx);
    }

    fn on_remove(&mut self, arena: &mut CacheObjectArena, idx: u32, _vtime: i64) {
        let obj = arena.get(idx);
        self.counts.remove_one(obj.freq);
        self.sizes.remove_one(obj.obj_size);
        self.ages.remove_one(obj.addition_vtime);
        self.deltas.remove(&idx);
        self.queue.unlink(arena, idx);
    }

    fn pick_victim(&self, arena: &CacheObjectArena, vtime: i64) -> Option<u32> {
        let window_tail = self.queue.tail?;
        let window_head = self.window_head(arena);
        let ctx = DecisionContext {
            arena,
            window_head,
            window_tail: Some(window_tail),
            current_vtime: vtime,
            counts: &self.counts,
            ages: &self.ages,
            sizes: &self.sizes,
            history: &self.history,
        };
        Some((self.decision_fn)(&ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object::CacheObject;

    #[test]
    fn default_lru_decision_evicts_the_tail() {
        let mut arena = CacheObjectArena::new();
        let mut policy =
            ScaffoldedPolicy::with_default_decision(ScaffoldedDecision::Lru, 10, 10, 10);

        let a = arena.insert(CacheObject::new(1, 1, 0));
        policy.on_insert(&mut arena, a, 0);
        let b = arena.insert(CacheObject::new(2, 1, 1));
        policy.on_insert(&mut arena, b, 1);
        policy.on_access(&mut arena, a, 2);

        let victim = policy.pick_victim(&arena, 3).unwrap();
        assert_eq!(arena.get(victim).obj_id, 2);
    }
}
