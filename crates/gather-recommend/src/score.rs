//! Per-event signals and their weighted combination.

use serde::Serialize;

use gather_models::{Event, RecommendationWeights, User};

use crate::geo::haversine_distance;

/// Proximity signal for a distance in metres: `1 / (1 + km)`.
///
/// 1.0 at the user's location, strictly decreasing with distance.
pub fn proximity(distance_m: f64) -> f64 {
    if !distance_m.is_finite() || distance_m < 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + distance_m / 1000.0)
}

/// The five raw, unweighted signals for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Favourite tags the event carries
    pub tags: f64,
    /// Followees attending
    pub followees: f64,
    /// Host's average rating, 0 without history
    pub host_rating: f64,
    /// Proximity, 0 when either side has no location
    pub distance: f64,
    /// Available media items
    pub media: f64,
}

impl ScoreBreakdown {
    pub fn compute(user: &User, event: &Event) -> Self {
        let tags = event.tags.intersection(&user.favourite_tags).count();
        let followees = event
            .attendee_ids
            .iter()
            .filter(|id| user.followees.contains(*id))
            .count();

        let host_rating = event
            .host_rating
            .filter(|r| r.is_finite() && *r >= 0.0)
            .unwrap_or(0.0);

        let distance = match (&user.location, &event.location) {
            (Some(from), Some(to)) => proximity(haversine_distance(from, to)),
            _ => 0.0,
        };

        Self {
            tags: tags as f64,
            followees: followees as f64,
            host_rating,
            distance,
            media: f64::from(event.media_count),
        }
    }

    /// Weighted sum of the signals.
    pub fn weighted(&self, weights: &RecommendationWeights) -> f64 {
        weights.tags * self.tags
            + weights.followees * self.followees
            + weights.host_rating * self.host_rating
            + weights.distance * self.distance
            + weights.media * self.media
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proximity_decreases() {
        assert_eq!(proximity(0.0), 1.0);
        assert_eq!(proximity(1000.0), 0.5);
        assert!(proximity(5_000.0) > proximity(50_000.0));
        assert_eq!(proximity(f64::NAN), 0.0);
    }

    #[test]
    fn test_breakdown_counts_overlaps() {
        let user = User::new("u1", "Ada")
            .with_favourite_tags(["jazz", "rooftop", "vinyl"])
            .with_followees(["f1", "f2"]);
        let event = Event::new("e1", "h1", "Rooftop jazz")
            .with_tags(["jazz", "rooftop", "outdoor"])
            .with_attendees(["f1", "stranger", "f2", "f3"])
            .with_media_count(4)
            .with_host_rating(4.5);

        let breakdown = ScoreBreakdown::compute(&user, &event);
        assert_eq!(
            breakdown,
            ScoreBreakdown {
                tags: 2.0,
                followees: 2.0,
                host_rating: 4.5,
                distance: 0.0,
                media: 4.0,
            }
        );
    }

    #[test]
    fn test_distance_needs_both_locations() {
        let event = Event::new("e1", "h1", "Picnic").with_location(52.52, 13.405);
        let nowhere = User::new("u1", "Ada");
        let here = User::new("u2", "Grace").with_location(52.52, 13.405);

        assert_eq!(ScoreBreakdown::compute(&nowhere, &event).distance, 0.0);
        assert_eq!(ScoreBreakdown::compute(&here, &event).distance, 1.0);
    }

    #[test]
    fn test_weighted_sum() {
        let breakdown = ScoreBreakdown {
            tags: 1.0,
            followees: 2.0,
            host_rating: 3.0,
            distance: 0.5,
            media: 4.0,
        };
        let weights = RecommendationWeights {
            tags: 2.0,
            followees: 1.0,
            host_rating: 0.0,
            distance: 2.0,
            media: 0.25,
        };
        assert_eq!(breakdown.weighted(&weights), 2.0 + 2.0 + 0.0 + 1.0 + 1.0);
    }
}
