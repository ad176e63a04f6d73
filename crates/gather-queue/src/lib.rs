//! In-memory processing queue with bounded concurrency.
//!
//! This crate provides:
//! - FIFO admission of jobs, each a plain `{id, run}` value
//! - A concurrency bound (default 1, strictly serial)
//! - A per-job completion handle that settles with that job's own outcome
//!
//! Queue state lives only in memory: pending and running jobs are lost if
//! the process exits.

pub mod error;
pub mod job;
pub mod metrics;
pub mod queue;

pub use error::{BoxError, QueueError, QueueResult};
pub use job::{JobHandle, ProcessingJob};
pub use queue::{ProcessingQueue, QueueConfig, QueueStats, DEFAULT_CONCURRENCY};
