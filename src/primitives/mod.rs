//! Low-level primitives shared by the reader and cache engine.
//!
//! Includes positioned file I/O and the little-endian binary record codec
//! used by fixed-layout trace formats.

/// Byte-level packed-record encoding for binary trace layouts.
pub mod codec;

/// Positioned, read-only file I/O abstractions.
pub mod io;
