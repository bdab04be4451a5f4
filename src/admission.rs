//! Admission gate: consulted once per miss, before the cache makes room for
//! a new object. Internal admission-algorithm design is out of scope for
//! this crate — the contract is the `Admission` trait and a declarative
//! selection among five named variants; each implementation here is a
//! modest, honestly labeled stand-in for the algorithm it's named after, not
//! a tuned reproduction.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::AdmissionKind;
use crate::request::Request;

/// The capability every admission policy satisfies.
pub trait Admission: Send {
    /// Whether a miss on `req` should be admitted into the cache at all.
    fn admit(&mut self, req: &Request) -> bool;
    /// Called after every miss (admitted or not) so size/cost-aware variants
    /// can track the current cache occupancy.
    fn update(&mut self, _req: &Request, _cache_occupied_bytes: u64) {}
}

/// Admits everything — the default when no admission policy is configured.
pub struct AlwaysAdmit;

impl Admission for AlwaysAdmit {
    fn admit(&mut self, _req: &Request) -> bool {
        true
    }
}

/// Admits nothing — used by the testable property "admission always false
/// implies miss ratio 1.0".
pub struct NeverAdmit;

impl Admission for NeverAdmit {
    fn admit(&mut self, _req: &Request) -> bool {
        false
    }
}

/// A small fixed-width Bloom filter: the first time an object is seen it is
/// only *recorded*, not admitted; only a second observation is admitted.
/// This is the "admit on second sight" shape the real bloom-filter admission
/// algorithm uses, without the real algorithm's filter-resizing policy.
pub struct BloomFilterAdmission {
    bits: Vec<u64>,
    mask: u64,
}

impl BloomFilterAdmission {
    pub fn new(num_bits: usize) -> Self {
        let words = num_bits.max(64).div_ceil(64);
        Self {
            bits: vec![0u64; words],
            mask: (words * 64 - 1) as u64,
        }
    }

    fn slot(&self, obj_id: u64) -> (usize, u64) {
        let bit = obj_id & self.mask;
        ((bit / 64) as usize, 1u64 << (bit % 64))
    }
}

impl Admission for BloomFilterAdmission {
    fn admit(&mut self, req: &Request) -> bool {
        let (word, bit) = self.slot(req.obj_id);
        let seen_before = self.bits[word] & bit != 0;
        self.bits[word] |= bit;
        seen_before
    }
}

/// Admits with fixed probability `p`, driven by a caller-supplied PRNG
/// rather than a process-global seed.
pub struct ProbabilisticAdmission {
    probability: f64,
    rng: ChaCha8Rng,
}

impl ProbabilisticAdmission {
    pub fn new(probability: f64, rng: ChaCha8Rng) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng,
        }
    }
}

impl Admission for ProbabilisticAdmission {
    fn admit(&mut self, _req: &Request) -> bool {
        self.rng.gen_bool(self.probability)
    }
}

/// Rejects objects above a fixed size threshold.
pub struct SizeAdmission {
    max_size: u64,
}

impl SizeAdmission {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }
}

impl Admission for SizeAdmission {
    fn admit(&mut self, req: &Request) -> bool {
        req.obj_size as u64 <= self.max_size
    }
}

/// Composes a size threshold with a probabilistic admission, biasing toward
/// admitting smaller objects more often.
pub struct SizeProbabilisticAdmission {
    max_size: u64,
    rng: ChaCha8Rng,
}

impl SizeProbabilisticAdmission {
    pub fn new(max_size: u64, rng: ChaCha8Rng) -> Self {
        Self { max_size, rng }
    }
}

impl Admission for SizeProbabilisticAdmission {
    fn admit(&mut self, req: &Request) -> bool {
        if req.obj_size as u64 > self.max_size {
            return false;
        }
        let ratio = 1.0 - (req.obj_size as f64 / self.max_size.max(1) as f64);
        self.rng.gen_bool(ratio.clamp(0.0, 1.0))
    }
}

/// A constant-threshold stand-in for AdaptSize's cost-aware admission: where
/// the real algorithm continually retunes its threshold from observed hit
/// rates, this tracks occupancy against a fixed fraction of capacity and
/// stops admitting once over budget, resuming once occupancy falls back
/// under the threshold.
pub struct AdaptSizeAdmission {
    capacity: u64,
    target_fraction: f64,
    over_budget: bool,
}

impl AdaptSizeAdmission {
    pub fn new(capacity: u64, target_fraction: f64) -> Self {
        Self {
            capacity,
            target_fraction: target_fraction.clamp(0.0, 1.0),
            over_budget: false,
        }
    }
}

impl Admission for AdaptSizeAdmission {
    fn admit(&mut self, _req: &Request) -> bool {
        !self.over_budget
    }

    fn update(&mut self, _req: &Request, cache_occupied_bytes: u64) {
        let occupied_fraction = cache_occupied_bytes as f64 / self.capacity.max(1) as f64;
        self.over_budget = occupied_fraction > self.target_fraction;
    }
}

/// Builds the declared admission policy. `capacity` and `rng` are supplied
/// by the driver, matching the design note that randomness is threaded in
/// explicitly rather than seeded from a process-global generator.
pub fn build(kind: AdmissionKind, capacity: u64, rng: ChaCha8Rng) -> Box<dyn Admission> {
    match kind {
        AdmissionKind::None => Box::new(AlwaysAdmit),
        AdmissionKind::BloomFilter => Box::new(BloomFilterAdmission::new(1 << 20)),
        AdmissionKind::Probabilistic => Box::new(ProbabilisticAdmission::new(0.5, rng)),
        AdmissionKind::Size => Box::new(SizeAdmission::new(capacity / 100)),
        AdmissionKind::SizeProbabilistic => {
            Box::new(SizeProbabilisticAdmission::new(capacity / 100, rng))
        }
        AdmissionKind::AdaptSize => Box::new(AdaptSizeAdmission::new(capacity, 0.9)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn req(id: u64, size: u32) -> Request {
        Request {
            obj_id: id,
            obj_size: size,
            ..Default::default()
        }
    }

    #[test]
    fn never_admit_rejects_everything() {
        let mut a = NeverAdmit;
        assert!(!a.admit(&req(1, 1)));
    }

    #[test]
    fn bloom_filter_admits_on_second_sight() {
        let mut a = BloomFilterAdmission::new(1024);
        assert!(!a.admit(&req(42, 1)));
        assert!(a.admit(&req(42, 1)));
    }

    #[test]
    fn size_admission_rejects_oversized() {
        let mut a = SizeAdmission::new(100);
        assert!(a.admit(&req(1, 50)));
        assert!(!a.admit(&req(1, 150)));
    }

    #[test]
    fn adapt_size_stops_admitting_once_over_budget() {
        let mut a = AdaptSizeAdmission::new(1000, 0.9);
        assert!(a.admit(&req(1, 1)));
        a.update(&req(1, 1), 950);
        assert!(!a.admit(&req(2, 1)));
        a.update(&req(2, 1), 500);
        assert!(a.admit(&req(3, 1)));
    }

    #[test]
    fn probabilistic_is_deterministic_given_a_seed() {
        let rng_a = ChaCha8Rng::seed_from_u64(7);
        let rng_b = ChaCha8Rng::seed_from_u64(7);
        let mut a = ProbabilisticAdmission::new(0.5, rng_a);
        let mut b = ProbabilisticAdmission::new(0.5, rng_b);
        for id in 0..50u64 {
            assert_eq!(a.admit(&req(id, 1)), b.admit(&req(id, 1)));
        }
    }
}
