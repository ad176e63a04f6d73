//! Request handlers.

pub mod events;
pub mod health;
pub mod media;
pub mod users;

pub use events::*;
pub use health::*;
pub use media::*;
pub use users::*;
