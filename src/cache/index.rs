use rustc_hash::FxHashMap;

/// Maps `obj_id` to its arena slot, backed by the same fast non-cryptographic
/// hasher the teacher uses for its own id-keyed caches.
#[derive(Default)]
pub struct HashIndex {
    map: FxHashMap<u64, u32>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    pub fn get(&self, obj_id: u64) -> Option<u32> {
        self.map.get(&obj_id).copied()
    }

    pub fn insert(&mut self, obj_id: u64, idx: u32) {
        self.map.insert(obj_id, idx);
    }

    pub fn remove(&mut self, obj_id: u64) -> Option<u32> {
        self.map.remove(&obj_id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, obj_id: u64) -> bool {
        self.map.contains_key(&obj_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut idx = HashIndex::new();
        idx.insert(7, 0);
        assert_eq!(idx.get(7), Some(0));
        assert_eq!(idx.remove(7), Some(0));
        assert_eq!(idx.get(7), None);
    }
}
