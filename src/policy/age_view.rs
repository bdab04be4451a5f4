use super::order_stat::OrderedMultiset;

/// A read-only view over resident objects' ages (`current_vtime -
/// addition_vtime`), backed by a multiset of raw `addition_vtime` values.
///
/// Percentile direction is inverted relative to the raw timestamp multiset:
/// since age decreases as `addition_vtime` increases, the 25th percentile
/// *age* corresponds to the 75th percentile *addition time* — so
/// `percentile(p)` queries the underlying multiset at `1 - p`.
#[derive(Debug, Clone, Default)]
pub struct AgePercentileView {
    addition_vtimes: OrderedMultiset<i64>,
}

impl AgePercentileView {
    pub fn new() -> Self {
        Self {
            addition_vtimes: OrderedMultiset::new(),
        }
    }

    pub fn insert(&mut self, addition_vtime: i64) {
        self.addition_vtimes.insert(addition_vtime);
    }

    pub fn remove_one(&mut self, addition_vtime: i64) {
        self.addition_vtimes.remove_one(addition_vtime);
    }

    pub fn is_empty(&self) -> bool {
        self.addition_vtimes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.addition_vtimes.len()
    }

    /// Age at the `p`-th percentile, given the current virtual time.
    pub fn percentile(&self, p: f64, current_vtime: i64) -> i64 {
        let inverted = (1.0 - p.clamp(0.0, 1.0)).clamp(0.0, 1.0);
        let addition_vtime = self.addition_vtimes.percentile(inverted);
        current_vtime - addition_vtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_percentile_inverts_direction() {
        let mut view = AgePercentileView::new();
        // addition times 0, 10, 20 -> ages at vtime 20 are 20, 10, 0.
        view.insert(0);
        view.insert(10);
        view.insert(20);
        // The 0th percentile of raw addition time is 0 -> the oldest
        // object -> the largest age.
        assert_eq!(view.percentile(0.0, 20), 20);
        assert_eq!(view.percentile(1.0, 20), 0);
    }
}
