//! # cachesim — trace-driven cache simulator
//!
//! Replays a sequence of object-access requests against an in-memory cache
//! configured with a chosen eviction policy and capacity, reporting miss
//! ratio and throughput. Built as a research workbench for comparing
//! eviction algorithms — LRU, frequency-node LFU, and a "scaffolded" policy
//! whose eviction decision is supplied externally — across heterogeneous
//! trace formats.
//!
//! ## Quick start
//!
//! ```rust
//! use cachesim::config::{PolicyKind, SimulatorConfig};
//! use cachesim::driver::SimulationDriver;
//!
//! # fn run() -> cachesim::Result<()> {
//! let mut config = SimulatorConfig::new("trace.oracleGeneral", 64 * 1024 * 1024);
//! config.policy = PolicyKind::Lru;
//! let driver = SimulationDriver::new(config)?;
//! let summary = driver.run()?;
//! println!("miss ratio: {:.4}", summary.miss_ratio);
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`request`]: the `Request` value type read from a trace.
//! - [`reader`]: trace readers for delimited text and packed binary layouts.
//! - [`sampler`]: deterministic spatial sampling by `obj_id`.
//! - [`cache`]: the arena-backed object store, hash index, and cache shell.
//! - [`policy`]: the `EvictionPolicy` trait plus the LRU, LFU, and scaffolded
//!   implementations.
//! - [`admission`]: the declarative pre-insert admission gate.
//! - [`driver`]: the simulation loop tying reader, cache, and reporting
//!   together.
//! - [`config`]: `SimulatorConfig`/`ReaderConfig` and the reader-params
//!   grammar.
//! - [`metrics`]: running hit/miss counters and report formatting helpers.

pub mod admission;
pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod primitives;
pub mod reader;
pub mod request;
pub mod sampler;

pub use crate::cache::Cache;
pub use crate::config::SimulatorConfig;
pub use crate::driver::{RunSummary, SimulationDriver};
pub use crate::error::{Result, SimError};
pub use crate::request::Request;
