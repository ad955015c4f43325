//! Conveyor - in-process concurrent job/task execution
//!
//! This library provides a job execution engine built around a fixed pool of
//! worker threads draining a shared, optionally bounded task queue. Clients
//! decompose a unit of work into a [`engine::Job`] that produces many
//! [`engine::Task`]s for parallel execution, then synchronize on job
//! completion.
//!
//! # High-Level API
//!
//! ```ignore
//! use conveyor::engine::{Conveyor, EngineConfig};
//!
//! let engine = Conveyor::new(EngineConfig::default().with_worker_threads(4));
//!
//! let handle = engine.submit_job(my_job)?;
//! handle.wait();
//!
//! engine.shutdown();
//! ```

pub mod engine;

/// Version of the conveyor library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
