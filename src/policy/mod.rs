//! Eviction policy framework: the capability trait every policy implements,
//! plus the two policies this crate ships — a frequency-node LFU and a
//! "scaffolded" policy that delegates its eviction decision to an externally
//! supplied closure.

mod age_view;
mod decision;
mod history;
mod lfu;
mod lru;
mod order_stat;
mod scaffolded;

pub use age_view::AgePercentileView;
pub use decision::{fifo_decision, lfu_decision, lru_decision, DecisionContext, DecisionFn};
pub use history::{EvictedMeta, History};
pub use lfu::FrequencyLfuPolicy;
pub use lru::LruPolicy;
pub use order_stat::OrderedMultiset;
pub use scaffolded::ScaffoldedPolicy;

use crate::cache::object::CacheObjectArena;

/// The capability set every eviction policy satisfies. Object-safe so the
/// driver and CLI can select a policy at runtime by name rather than at
/// compile time.
///
/// `free` has no method here: policy state is destroyed by ordinary `Drop`
/// when the owning [`crate::cache::shell::Cache`] (or the policy itself) goes
/// out of scope, rather than a hand-rolled teardown step.
pub trait EvictionPolicy: Send {
    /// Human-readable policy name, used in report lines.
    fn name(&self) -> &'static str;

    /// Called once, immediately after a new object is linked into the arena
    /// and hash index.
    fn on_insert(&mut self, arena: &mut CacheObjectArena, idx: u32, vtime: i64);

    /// Called on every cache hit, before the caller does anything else with
    /// `idx`. Implementations that track `last_access_vtime` are responsible
    /// for updating it themselves, since some (e.g. plain LRU) don't need it
    /// at all and a caller-side update would be wasted work for them.
    fn on_access(&mut self, arena: &mut CacheObjectArena, idx: u32, vtime: i64);

    /// Called once eviction of `idx` has been decided; the caller unlinks it
    /// from the hash index and frees the arena slot immediately afterward.
    fn on_evict(&mut self, arena: &mut CacheObjectArena, idx: u32, vtime: i64);

    /// Called for a user-initiated removal (`Cache::remove`), which must not
    /// be counted as an eviction. Default: same structural cleanup as
    /// `on_evict`; a policy that records eviction-only statistics (e.g. the
    /// scaffolded policy's history) overrides this to skip that recording.
    fn on_remove(&mut self, arena: &mut CacheObjectArena, idx: u32, vtime: i64) {
        self.on_evict(arena, idx, vtime);
    }

    /// Selects a victim without mutating policy state. Returns `None` only
    /// when the policy has no resident objects.
    fn pick_victim(&self, arena: &CacheObjectArena, vtime: i64) -> Option<u32>;

    /// Whether `pick_victim` can be called repeatedly without side effects
    /// (true for every policy in this crate); a policy that can only preview
    /// by mutating state should override this to `false` and have its
    /// `to_evict` caller translate that into `UnsupportedOperation`.
    fn supports_preview(&self) -> bool {
        true
    }
}
