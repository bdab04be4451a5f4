/// One resident object's metadata, with intrusive doubly-linked queue slots
/// so policies can splice objects between lists in O(1) without a separate
/// heap allocation per link.
#[derive(Debug, Clone)]
pub struct CacheObject {
    pub obj_id: u64,
    pub obj_size: u64,
    pub freq: u32,
    pub last_access_vtime: i64,
    pub addition_vtime: i64,
    pub next_access_vtime: i64,
    pub(crate) prev: Option<u32>,
    pub(crate) next: Option<u32>,
}

impl CacheObject {
    pub fn new(obj_id: u64, obj_size: u64, vtime: i64) -> Self {
        Self {
            obj_id,
            obj_size,
            freq: 0,
            last_access_vtime: vtime,
            addition_vtime: vtime,
            next_access_vtime: -1,
            prev: None,
            next: None,
        }
    }
}

enum Slot {
    Occupied(CacheObject),
    Free(Option<u32>),
}

/// An arena of cache objects addressed by stable `u32` indices rather than
/// pointers — intrusive links are plain indices into this arena, so there is
/// no unsafe code and no reference-counted cycle to break.
#[derive(Default)]
pub struct CacheObjectArena {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    len: usize,
}

impl CacheObjectArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, obj: CacheObject) -> u32 {
        self.len += 1;
        if let Some(idx) = self.free_head {
            let next_free = match &self.slots[idx as usize] {
                Slot::Free(next) => *next,
                Slot::Occupied(_) => unreachable!("free list points at occupied slot"),
            };
            self.free_head = next_free;
            self.slots[idx as usize] = Slot::Occupied(obj);
            idx
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot::Occupied(obj));
            idx
        }
    }

    pub fn remove(&mut self, idx: u32) -> CacheObject {
        let slot = std::mem::replace(&mut self.slots[idx as usize], Slot::Free(self.free_head));
        self.free_head = Some(idx);
        self.len -= 1;
        match slot {
            Slot::Occupied(obj) => obj,
            Slot::Free(_) => panic!("removing index {idx} that is already free"),
        }
    }

    pub fn get(&self, idx: u32) -> &CacheObject {
        match &self.slots[idx as usize] {
            Slot::Occupied(obj) => obj,
            Slot::Free(_) => panic!("accessing freed index {idx}"),
        }
    }

    pub fn get_mut(&mut self, idx: u32) -> &mut CacheObject {
        match &mut self.slots[idx as usize] {
            Slot::Occupied(obj) => obj,
            Slot::Free(_) => panic!("accessing freed index {idx}"),
        }
    }
}

/// An intrusive doubly-linked list over [`CacheObjectArena`] slots. Multiple
/// disjoint lists (e.g. one per frequency bucket) can coexist over the same
/// arena because each object belongs to exactly one list at a time.
#[derive(Debug, Clone, Default)]
pub struct IntrusiveList {
    pub head: Option<u32>,
    pub tail: Option<u32>,
    pub len: usize,
}

impl IntrusiveList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push_back(&mut self, arena: &mut CacheObjectArena, idx: u32) {
        arena.get_mut(idx).prev = self.tail;
        arena.get_mut(idx).next = None;
        if let Some(tail) = self.tail {
            arena.get_mut(tail).next = Some(idx);
        } else {
            self.head = Some(idx);
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    pub fn push_front(&mut self, arena: &mut CacheObjectArena, idx: u32) {
        arena.get_mut(idx).next = self.head;
        arena.get_mut(idx).prev = None;
        if let Some(head) = self.head {
            arena.get_mut(head).prev = Some(idx);
        } else {
            self.tail = Some(idx);
        }
        self.head = Some(idx);
        self.len += 1;
    }

    /// Removes `idx` from this list. `idx` must currently belong to it.
    pub fn unlink(&mut self, arena: &mut CacheObjectArena, idx: u32) {
        let (prev, next) = {
            let obj = arena.get(idx);
            (obj.prev, obj.next)
        };
        match prev {
            Some(p) => arena.get_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => arena.get_mut(n).prev = prev,
            None => self.tail = prev,
        }
        arena.get_mut(idx).prev = None;
        arena.get_mut(idx).next = None;
        self.len -= 1;
    }

    pub fn pop_front(&mut self, arena: &mut CacheObjectArena) -> Option<u32> {
        let idx = self.head?;
        self.unlink(arena, idx);
        Some(idx)
    }

    pub fn move_to_front(&mut self, arena: &mut CacheObjectArena, idx: u32) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(arena, idx);
        self.push_front(arena, idx);
    }
}
