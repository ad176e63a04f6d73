//! Queue error types.

use thiserror::Error;

/// Error type returned by a job's unit of work.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    /// The job's unit of work returned an error.
    #[error("Job {job_id} failed: {source}")]
    JobFailed {
        job_id: String,
        #[source]
        source: BoxError,
    },

    /// The job's unit of work panicked instead of returning.
    #[error("Job {job_id} panicked: {message}")]
    JobPanicked { job_id: String, message: String },

    /// The job was dropped before it settled (runtime shut down).
    #[error("Job {job_id} was abandoned before completion")]
    Abandoned { job_id: String },

    #[error("Invalid concurrency bound: {0} (must be at least 1)")]
    InvalidConcurrency(usize),
}

impl QueueError {
    /// Identifier of the job this error belongs to, if any.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            QueueError::JobFailed { job_id, .. }
            | QueueError::JobPanicked { job_id, .. }
            | QueueError::Abandoned { job_id } => Some(job_id),
            QueueError::InvalidConcurrency(_) => None,
        }
    }

    /// Recover the job's own error if it has type `E`.
    ///
    /// Returns the original queue error unchanged otherwise.
    pub fn downcast_source<E>(self) -> Result<E, QueueError>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            QueueError::JobFailed { job_id, source } => match source.downcast::<E>() {
                Ok(err) => Ok(*err),
                Err(source) => Err(QueueError::JobFailed { job_id, source }),
            },
            other => Err(other),
        }
    }
}
