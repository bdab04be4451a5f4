use crate::cache::object::CacheObjectArena;

use super::age_view::AgePercentileView;
use super::history::History;
use super::order_stat::OrderedMultiset;

/// Everything an eviction-decision function may read about the scaffolded
/// policy's state. Mutating through these references is not exposed — the
/// policy applies the actual eviction after the function returns.
pub struct DecisionContext<'a> {
    pub arena: &'a CacheObjectArena,
    /// Bounds (inclusive) of the tail candidate window, in queue order.
    pub window_head: Option<u32>,
    pub window_tail: Option<u32>,
    pub current_vtime: i64,
    pub counts: &'a OrderedMultiset<u32>,
    pub ages: &'a AgePercentileView,
    pub sizes: &'a OrderedMultiset<u64>,
    pub history: &'a History,
}

impl<'a> DecisionContext<'a> {
    /// Walks the candidate window from head to tail, inclusive.
    pub fn window(&self) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = self.window_head;
        while let Some(idx) = cur {
            out.push(idx);
            if Some(idx) == self.window_tail {
                break;
            }
            cur = self.arena.get(idx).next;
        }
        out
    }
}

/// A boxed decision closure matching the frozen external signature: given a
/// read-only view of candidates and statistics, return the arena index to
/// evict. The scaffolded policy treats this as a runtime-injected dependency
/// rather than a compile-time strategy parameter, so it can be swapped for a
/// generated heuristic without recompiling the cache engine.
pub type DecisionFn = Box<dyn Fn(&DecisionContext) -> u32 + Send>;

/// Evicts the object at the tail of the candidate window (queue order is
/// recency order, head = most recently accessed).
pub fn lru_decision(ctx: &DecisionContext) -> u32 {
    ctx.window_tail
        .or(ctx.window_head)
        .expect("pick_victim only called on a non-empty cache")
}

/// Evicts the object with the smallest `addition_vtime` in the window.
pub fn fifo_decision(ctx: &DecisionContext) -> u32 {
    ctx.window()
        .into_iter()
        .min_by_key(|&idx| ctx.arena.get(idx).addition_vtime)
        .expect("pick_victim only called on a non-empty cache")
}

/// Evicts the object with the smallest access count in the window.
pub fn lfu_decision(ctx: &DecisionContext) -> u32 {
    ctx.window()
        .into_iter()
        .min_by_key(|&idx| ctx.arena.get(idx).freq)
        .expect("pick_victim only called on a non-empty cache")
}
