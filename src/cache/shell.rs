use tracing::debug;

use crate::admission::Admission;
use crate::error::{Result, SimError};
use crate::policy::EvictionPolicy;
use crate::request::Request;

use super::index::HashIndex;
use super::object::{CacheObject, CacheObjectArena};

/// Fixed per-object bookkeeping overhead counted against capacity alongside
/// `obj_size`, matching the data model's invariant I1
/// (`sum(obj_size + per_object_metadata_size) <= capacity`).
pub const DEFAULT_METADATA_OVERHEAD_BYTES: u64 = 64;

/// The cache shell: capacity accounting and get/find/insert/evict/remove
/// orchestration, generic over whichever eviction and admission policy a run
/// was configured with.
pub struct Cache {
    arena: CacheObjectArena,
    index: HashIndex,
    capacity: u64,
    occupied_bytes: u64,
    n_req: i64,
    metadata_overhead: u64,
    policy: Box<dyn EvictionPolicy>,
    admission: Box<dyn Admission>,
}

impl Cache {
    pub fn new(capacity: u64, policy: Box<dyn EvictionPolicy>, admission: Box<dyn Admission>) -> Self {
        Self::with_overhead(capacity, policy, admission, DEFAULT_METADATA_OVERHEAD_BYTES)
    }

    pub fn with_overhead(
        capacity: u64,
        policy: Box<dyn EvictionPolicy>,
        admission: Box<dyn Admission>,
        metadata_overhead: u64,
    ) -> Self {
        Self {
            arena: CacheObjectArena::new(),
            index: HashIndex::new(),
            capacity,
            occupied_bytes: 0,
            n_req: 0,
            metadata_overhead,
            policy,
            admission,
        }
    }

    pub fn cache_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn occupied_bytes(&self) -> u64 {
        self.occupied_bytes
    }

    pub fn n_resident(&self) -> usize {
        self.arena.len()
    }

    pub fn n_req(&self) -> i64 {
        self.n_req
    }

    fn object_footprint(&self, obj_size: u64) -> u64 {
        obj_size + self.metadata_overhead
    }

    /// Looks up `req.obj_id` without side effects beyond the optional
    /// recency update; does not advance virtual time or admit on miss.
    pub fn find(&mut self, req: &Request, update: bool) -> bool {
        match self.index.get(req.obj_id) {
            Some(idx) => {
                if update {
                    self.policy.on_access(&mut self.arena, idx, self.n_req);
                }
                true
            }
            None => false,
        }
    }

    /// The full get path: hit updates policy state; miss consults admission,
    /// makes room, and inserts if admitted.
    pub fn get(&mut self, req: &Request) -> Result<bool> {
        self.n_req += 1;
        if let Some(idx) = self.index.get(req.obj_id) {
            self.policy.on_access(&mut self.arena, idx, self.n_req);
            return Ok(true);
        }

        if !self.admission.admit(req) {
            self.admission.update(req, self.occupied_bytes);
            return Ok(false);
        }

        // §7: `ObjectTooLarge` is normal control flow for `get` — the
        // request is counted as a miss and nothing is inserted, not a fatal
        // error that should abort the run.
        let footprint = self.object_footprint(req.obj_size as u64);
        if footprint > self.capacity {
            return Ok(false);
        }
        match self.make_room_for(footprint) {
            Ok(()) => {}
            Err(SimError::ObjectTooLarge { .. }) => return Ok(false),
            Err(e) => return Err(e),
        }
        self.insert(req)?;
        self.admission.update(req, self.occupied_bytes);
        Ok(false)
    }

    /// Inserts `req` as a new resident object. Caller must have already
    /// ensured enough free space via `make_room_for`.
    pub fn insert(&mut self, req: &Request) -> Result<()> {
        let footprint = self.object_footprint(req.obj_size as u64);
        if self.occupied_bytes + footprint > self.capacity {
            return Err(SimError::InvariantViolation(
                "insert called without enough free space".into(),
            ));
        }
        let obj = CacheObject::new(req.obj_id, req.obj_size as u64, self.n_req);
        let idx = self.arena.insert(obj);
        self.index.insert(req.obj_id, idx);
        self.occupied_bytes += footprint;
        self.policy.on_insert(&mut self.arena, idx, self.n_req);
        Ok(())
    }

    /// Evicts one object chosen by the policy.
    pub fn evict(&mut self) -> Result<u64> {
        let idx = self
            .policy
            .pick_victim(&self.arena, self.n_req)
            .ok_or_else(|| SimError::InvariantViolation("evict called on an empty cache".into()))?;
        let (obj_id, footprint) = {
            let obj = self.arena.get(idx);
            (obj.obj_id, self.object_footprint(obj.obj_size))
        };
        self.policy.on_evict(&mut self.arena, idx, self.n_req);
        self.index.remove(obj_id);
        self.arena.remove(idx);
        self.occupied_bytes -= footprint;
        debug!(obj_id, "evicted object");
        Ok(obj_id)
    }

    /// Evicts repeatedly until `additional` bytes of free space exist, or
    /// fails with `ObjectTooLarge` if the cache empties out first.
    pub fn make_room_for(&mut self, additional: u64) -> Result<()> {
        while self.occupied_bytes + additional > self.capacity {
            if self.n_resident() == 0 {
                return Err(SimError::ObjectTooLarge {
                    size: additional,
                    capacity: self.capacity,
                });
            }
            self.evict()?;
        }
        Ok(())
    }

    /// User-initiated removal; does not count as an eviction.
    pub fn remove(&mut self, obj_id: u64) -> bool {
        let Some(idx) = self.index.remove(obj_id) else {
            return false;
        };
        let footprint = self.object_footprint(self.arena.get(idx).obj_size);
        self.policy.on_remove(&mut self.arena, idx, self.n_req);
        self.arena.remove(idx);
        self.occupied_bytes -= footprint;
        true
    }

    /// Previews the next eviction victim's `obj_id` without mutating any
    /// state. Fails with `UnsupportedOperation` for a policy that can't
    /// decouple preview from mutation.
    pub fn to_evict(&self, _req: &Request) -> Result<Option<u64>> {
        if !self.policy.supports_preview() {
            return Err(SimError::UnsupportedOperation {
                policy: self.policy.name(),
                operation: "to_evict",
            });
        }
        Ok(self
            .policy
            .pick_victim(&self.arena, self.n_req)
            .map(|idx| self.arena.get(idx).obj_id))
    }

    pub fn print_cache(&self) {
        println!(
            "cache[{}]: {}/{} bytes, {} resident objects",
            self.cache_name(),
            self.occupied_bytes,
            self.capacity,
            self.n_resident()
        );
    }
}
