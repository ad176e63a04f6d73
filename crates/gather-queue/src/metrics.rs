//! Queue metrics.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const QUEUE_PENDING: &str = "gather_queue_pending";
    pub const QUEUE_RUNNING: &str = "gather_queue_running";
    pub const QUEUE_JOBS_TOTAL: &str = "gather_queue_jobs_total";
    pub const QUEUE_WAIT_SECONDS: &str = "gather_queue_wait_seconds";
    pub const QUEUE_RUN_SECONDS: &str = "gather_queue_run_seconds";
}

/// Job outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
    Panicked,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Failed => "failed",
            Outcome::Panicked => "panicked",
        }
    }
}

/// Update pending/running gauges for a queue.
pub fn set_depth(queue: &str, pending: usize, running: usize) {
    let labels = [("queue", queue.to_string())];
    gauge!(names::QUEUE_PENDING, &labels).set(pending as f64);
    gauge!(names::QUEUE_RUNNING, &labels).set(running as f64);
}

/// Record how long a job waited before it started.
pub fn record_wait(queue: &str, secs: f64) {
    let labels = [("queue", queue.to_string())];
    histogram!(names::QUEUE_WAIT_SECONDS, &labels).record(secs);
}

/// Record a settled job.
pub fn record_settled(queue: &str, outcome: Outcome, run_secs: f64) {
    let labels = [
        ("queue", queue.to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];
    counter!(names::QUEUE_JOBS_TOTAL, &labels).increment(1);
    histogram!(names::QUEUE_RUN_SECONDS, &labels).record(run_secs);
}
