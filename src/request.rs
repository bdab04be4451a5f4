use smallvec::SmallVec;

/// Sentinel used in `next_access_vtime` fields to mean "no future access".
pub const NO_FUTURE_ACCESS: i64 = -1;

/// Number of inline feature-field slots before a `Request`'s feature vector
/// spills to the heap. Mirrors the original trace format's fixed-width
/// feature array for the common (small) case.
pub const INLINE_FEATURES: usize = 4;

/// Request operation kind, present only when a trace's `op-col` is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    #[default]
    Get,
    Set,
    Delete,
    Other(u8),
}

/// One access event read from a trace.
///
/// `valid` is `false` only for the sentinel value returned at end of stream;
/// every other field on a valid request is populated by the reader according
/// to its configured column mapping (unmapped fields are left at their
/// default).
#[derive(Debug, Clone)]
pub struct Request {
    pub clock_time: u32,
    pub obj_id: u64,
    pub obj_size: u32,
    pub next_access_vtime: i64,
    pub op: Option<Op>,
    pub tenant: Option<u32>,
    pub ttl: Option<u32>,
    pub features: SmallVec<[f32; INLINE_FEATURES]>,
    pub valid: bool,
}

impl Request {
    /// The sentinel "end of stream" request.
    pub fn invalid() -> Self {
        Self {
            clock_time: 0,
            obj_id: 0,
            obj_size: 0,
            next_access_vtime: NO_FUTURE_ACCESS,
            op: None,
            tenant: None,
            ttl: None,
            features: SmallVec::new(),
            valid: false,
        }
    }

    pub fn has_future_access(&self) -> bool {
        self.next_access_vtime != NO_FUTURE_ACCESS
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::invalid()
    }
}
