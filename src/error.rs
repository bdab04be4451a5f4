use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// The error taxonomy for the whole simulator: reader, cache engine, and
/// driver all funnel into this one enum so callers never need to match on
/// subsystem-specific types.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("failed to open trace {path}: {source}")]
    IoOpenFailed { path: PathBuf, source: io::Error },

    #[error("failed to stat trace {path}: {source}")]
    IoStatFailed { path: PathBuf, source: io::Error },

    #[error("failed to map trace {path}: {source}")]
    MmapFailed { path: PathBuf, source: io::Error },

    #[error("malformed trace record at offset {offset} in {path}: {reason}")]
    TraceMalformed {
        path: PathBuf,
        offset: u64,
        reason: String,
    },

    /// Not a failure: normal end-of-stream signal from a reader.
    #[error("end of trace stream")]
    EndOfStream,

    #[error("object of size {size} exceeds cache capacity {capacity}")]
    ObjectTooLarge { size: u64, capacity: u64 },

    #[error("operation unsupported by policy '{policy}': {operation}")]
    UnsupportedOperation {
        policy: &'static str,
        operation: &'static str,
    },

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
