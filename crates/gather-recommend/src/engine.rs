//! Ranking entry points.

use serde::Serialize;

use gather_models::{Event, User};

use crate::error::{RecommendError, RecommendResult};
use crate::score::ScoreBreakdown;

/// A candidate event with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEvent {
    pub event: Event,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Mean of a host's past event ratings, `None` without history.
///
/// Non-finite entries are ignored.
pub fn average_rating(ratings: &[f64]) -> Option<f64> {
    let (sum, count) = ratings
        .iter()
        .filter(|r| r.is_finite())
        .fold((0.0, 0usize), |(sum, count), r| (sum + r, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Rank `events` for `user`, best first.
///
/// Fails with [`RecommendError::InvalidArgument`] before scoring anything if
/// the user is missing, the candidate list is empty, or the user's weights
/// are invalid. Events with equal scores keep their relative input order.
pub fn recommend(user: Option<&User>, events: Vec<Event>) -> RecommendResult<Vec<ScoredEvent>> {
    let user = user.ok_or_else(|| RecommendError::invalid_argument("user is required"))?;
    if events.is_empty() {
        return Err(RecommendError::invalid_argument(
            "at least one candidate event is required",
        ));
    }
    user.weights.validate()?;

    let mut scored: Vec<ScoredEvent> = events
        .into_iter()
        .map(|event| {
            let breakdown = ScoreBreakdown::compute(user, &event);
            ScoredEvent {
                score: breakdown.weighted(&user.weights),
                event,
                breakdown,
            }
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(scored)
}

/// [`recommend`], truncated to the best `limit` events.
pub fn recommend_top(
    user: Option<&User>,
    events: Vec<Event>,
    limit: usize,
) -> RecommendResult<Vec<ScoredEvent>> {
    let mut ranked = recommend(user, events)?;
    ranked.truncate(limit);
    Ok(ranked)
}
