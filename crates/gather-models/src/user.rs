//! User models and per-user recommendation settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ModelError, ModelResult};
use crate::event::Coordinates;
use crate::ids::UserId;

/// Neutral multiplier applied to every signal when a user has not customised
/// their weights.
pub const NEUTRAL_WEIGHT: f64 = 1.0;

/// Multipliers combined linearly by the recommendation engine.
///
/// All weights must be finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecommendationWeights {
    /// Weight of the favourite-tag intersection size
    #[serde(default = "neutral")]
    pub tags: f64,
    /// Weight of the number of followees attending
    #[serde(default = "neutral")]
    pub followees: f64,
    /// Weight of the host's average event rating
    #[serde(default = "neutral")]
    pub host_rating: f64,
    /// Weight of the proximity term
    #[serde(default = "neutral")]
    pub distance: f64,
    /// Weight of the media item count
    #[serde(default = "neutral")]
    pub media: f64,
}

fn neutral() -> f64 {
    NEUTRAL_WEIGHT
}

impl Default for RecommendationWeights {
    fn default() -> Self {
        Self::uniform(NEUTRAL_WEIGHT)
    }
}

impl RecommendationWeights {
    /// Every weight set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self {
            tags: value,
            followees: value,
            host_rating: value,
            distance: value,
            media: value,
        }
    }

    /// Multiply every weight by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            tags: self.tags * factor,
            followees: self.followees * factor,
            host_rating: self.host_rating * factor,
            distance: self.distance * factor,
            media: self.media * factor,
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        for (field, value) in [
            ("tags", self.tags),
            ("followees", self.followees),
            ("host_rating", self.host_rating),
            ("distance", self.distance),
            ("media", self.media),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidWeight { field, value });
            }
        }
        Ok(())
    }
}

/// A user account as seen by the recommendation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct User {
    pub id: UserId,

    pub name: String,

    #[serde(default)]
    pub favourite_tags: BTreeSet<String>,

    /// Users this user follows
    #[serde(default)]
    pub followees: BTreeSet<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,

    #[serde(default)]
    pub weights: RecommendationWeights,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            favourite_tags: BTreeSet::new(),
            followees: BTreeSet::new(),
            location: None,
            weights: RecommendationWeights::default(),
        }
    }

    pub fn with_favourite_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favourite_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_followees<I, U>(mut self, followees: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        self.followees = followees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(Coordinates::new(lat, lon));
        self
    }

    pub fn with_weights(mut self, weights: RecommendationWeights) -> Self {
        self.weights = weights;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_neutral() {
        let weights = RecommendationWeights::default();
        assert_eq!(weights, RecommendationWeights::uniform(NEUTRAL_WEIGHT));
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let weights = RecommendationWeights {
            media: -0.5,
            ..Default::default()
        };
        assert_eq!(
            weights.validate(),
            Err(ModelError::InvalidWeight {
                field: "media",
                value: -0.5
            })
        );
    }

    #[test]
    fn test_partial_weights_fill_with_neutral() {
        let weights: RecommendationWeights = serde_json::from_str(r#"{"tags": 3.0}"#).unwrap();
        assert_eq!(weights.tags, 3.0);
        assert_eq!(weights.distance, NEUTRAL_WEIGHT);
    }

    #[test]
    fn test_scaled() {
        let weights = RecommendationWeights::uniform(2.0).scaled(1.5);
        assert_eq!(weights, RecommendationWeights::uniform(3.0));
    }
}
