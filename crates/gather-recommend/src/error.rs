//! Error types for ranking.

use thiserror::Error;

use gather_models::ModelError;

pub type RecommendResult<T> = Result<T, RecommendError>;

#[derive(Debug, Error, PartialEq)]
pub enum RecommendError {
    /// The caller broke a precondition; nothing was scored.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl RecommendError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<ModelError> for RecommendError {
    fn from(err: ModelError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
