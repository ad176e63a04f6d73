//! Personalised event ranking.
//!
//! Every candidate event gets five raw signals (favourite-tag overlap,
//! followees attending, host rating, proximity and media count) which are
//! combined linearly with the user's [`RecommendationWeights`]. Candidates
//! are returned best first; equal scores keep their input order.
//!
//! Ranking is a pure function of its inputs: no I/O, no randomness and no
//! state kept between calls.
//!
//! [`RecommendationWeights`]: gather_models::RecommendationWeights

pub mod engine;
pub mod error;
pub mod geo;
pub mod score;

pub use engine::{average_rating, recommend, recommend_top, ScoredEvent};
pub use error::{RecommendError, RecommendResult};
pub use geo::{haversine_distance, EARTH_RADIUS_M};
pub use score::{proximity, ScoreBreakdown};
