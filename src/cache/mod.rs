//! The cache engine: an arena-backed object store and hash index (D), and
//! the cache shell (E) orchestrating get/find/insert/evict/remove on top of
//! whichever [`crate::policy::EvictionPolicy`] and
//! [`crate::admission::Admission`] a run was configured with.

pub mod index;
pub mod object;
pub mod shell;

pub use shell::Cache;
