//! Structured job logging.

use tracing::{error, info, warn};

/// Logs media job lifecycle events with the job id and operation attached.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            operation: operation.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    /// Log completion with the elapsed time.
    pub fn log_completion(&self, message: &str, duration_ms: u128) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            duration_ms = %duration_ms,
            "Job completed: {}", message
        );
    }
}
