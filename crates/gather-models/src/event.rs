//! Event models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ModelError, ModelResult};
use crate::ids::{EventId, UserId};

/// Highest rating an attendee can give an event.
pub const MAX_RATING: f64 = 5.0;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    /// Latitude in degrees, -90..=90
    pub lat: f64,
    /// Longitude in degrees, -180..=180
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that both components are finite and in range.
    pub fn validate(&self) -> ModelResult<()> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lon_ok = self.lon.is_finite() && (-180.0..=180.0).contains(&self.lon);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(ModelError::InvalidCoordinates {
                lat: self.lat,
                lon: self.lon,
            })
        }
    }
}

/// An event hosted by a user.
///
/// When used as a recommendation candidate, `host_rating` carries the
/// host's historical average rating as aggregated by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Event {
    pub id: EventId,

    /// Hosting user
    pub host_id: UserId,

    pub title: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// Users attending the event
    #[serde(default)]
    pub attendee_ids: Vec<UserId>,

    /// Number of media items (clips, images) available for the event
    #[serde(default)]
    pub media_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,

    /// Ratings attendees gave this event after it took place
    #[serde(default)]
    pub ratings: Vec<f64>,

    /// Host's average rating across their past events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_rating: Option<f64>,
}

impl Event {
    /// Create an event with no tags, attendees or media.
    pub fn new(id: impl Into<EventId>, host_id: impl Into<UserId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host_id: host_id.into(),
            title: title.into(),
            tags: BTreeSet::new(),
            attendee_ids: Vec::new(),
            media_count: 0,
            location: None,
            starts_at: None,
            ratings: Vec::new(),
            host_rating: None,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attendees<I, U>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserId>,
    {
        self.attendee_ids = attendees.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(Coordinates::new(lat, lon));
        self
    }

    pub fn with_media_count(mut self, count: u32) -> Self {
        self.media_count = count;
        self
    }

    pub fn with_host_rating(mut self, rating: f64) -> Self {
        self.host_rating = Some(rating);
        self
    }

    /// Record an attendee rating.
    pub fn add_rating(&mut self, rating: f64) -> ModelResult<()> {
        if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
            return Err(ModelError::InvalidRating(rating));
        }
        self.ratings.push(rating);
        Ok(())
    }

    /// Mean of this event's ratings, `None` if nobody rated it.
    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        Some(self.ratings.iter().sum::<f64>() / self.ratings.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(52.52, 13.405).validate().is_ok());
        assert!(Coordinates::new(91.0, 0.0).validate().is_err());
        assert!(Coordinates::new(0.0, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_average_rating() {
        let mut event = Event::new("e1", "host", "Rooftop jazz");
        assert_eq!(event.average_rating(), None);

        event.add_rating(4.0).unwrap();
        event.add_rating(5.0).unwrap();
        assert_eq!(event.average_rating(), Some(4.5));
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let mut event = Event::new("e1", "host", "Rooftop jazz");
        assert_eq!(event.add_rating(7.5), Err(ModelError::InvalidRating(7.5)));
        assert!(event.ratings.is_empty());
    }

    #[test]
    fn test_event_deserializes_with_defaults() {
        let event: Event = serde_json::from_str(
            r#"{"id":"e1","host_id":"h1","title":"Board games"}"#,
        )
        .unwrap();
        assert!(event.tags.is_empty());
        assert_eq!(event.media_count, 0);
        assert!(event.location.is_none());
    }
}
