use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Deterministic, object-keyed spatial sampler.
///
/// Given a ratio `r` in `[0, 1]`, a request is kept iff `hash(obj_id)` falls
/// in the lower `r` fraction of the `u64` range. Every request for a kept
/// object is kept, and two samplers built with the same ratio agree on every
/// `obj_id` without sharing state — the hash is keyed with a fixed `(0, 0)`
/// key rather than a random per-process seed.
#[derive(Debug, Clone)]
pub struct Sampler {
    ratio: f64,
    threshold: u64,
}

impl Sampler {
    /// `ratio` is clamped to `[0.0, 1.0]`.
    pub fn new(ratio: f64) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        let threshold = (ratio * u64::MAX as f64) as u64;
        Self { ratio, threshold }
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn accepts(&self, obj_id: u64) -> bool {
        hash_obj_id(obj_id) <= self.threshold
    }
}

fn hash_obj_id(obj_id: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(obj_id);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_ratio_same_decisions() {
        let a = Sampler::new(0.5);
        let b = Sampler::new(0.5);
        for id in 0..10_000u64 {
            assert_eq!(a.accepts(id), b.accepts(id));
        }
    }

    #[test]
    fn ratio_zero_rejects_everything() {
        let s = Sampler::new(0.0);
        for id in 0..1_000u64 {
            assert!(!s.accepts(id));
        }
    }

    #[test]
    fn ratio_one_accepts_everything() {
        let s = Sampler::new(1.0);
        for id in 0..1_000u64 {
            assert!(s.accepts(id));
        }
    }
}
