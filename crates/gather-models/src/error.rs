//! Model validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid weight for {field}: {value} (must be finite and non-negative)")]
    InvalidWeight { field: &'static str, value: f64 },

    #[error("Invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Invalid rating: {0} (must be between 0 and 5)")]
    InvalidRating(f64),
}
