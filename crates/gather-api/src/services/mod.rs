//! Business logic services.

pub mod upload;

pub use upload::{PendingUpload, UploadService};
