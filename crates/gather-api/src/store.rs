//! In-memory catalog of users, events and media records.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::RwLock;
use tracing::debug;

use gather_models::{
    Event, EventId, MediaId, MediaRecord, MediaStatus, RecommendationWeights, User, UserId,
};
use gather_recommend::average_rating;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    events: HashMap<EventId, Event>,
    media: HashMap<MediaId, MediaRecord>,
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct Catalog {
    tables: RwLock<Tables>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user's profile. Stored weights are kept: they only
    /// change through [`Catalog::update_weights`].
    pub async fn upsert_user(&self, mut user: User) -> User {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.users.get(&user.id) {
            user.weights = existing.weights;
        }
        tables.users.insert(user.id.clone(), user.clone());
        user
    }

    pub async fn get_user(&self, id: &UserId) -> Option<User> {
        self.tables.read().await.users.get(id).cloned()
    }

    /// Replace a user's weights, `None` if the user does not exist.
    pub async fn update_weights(
        &self,
        id: &UserId,
        weights: RecommendationWeights,
    ) -> Option<RecommendationWeights> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(id)?;
        user.weights = weights;
        Some(weights)
    }

    /// Insert or replace an event. Ratings and the media count are managed by
    /// the server and survive the replace.
    pub async fn upsert_event(&self, mut event: Event) -> Event {
        let mut tables = self.tables.write().await;
        match tables.events.get(&event.id) {
            Some(existing) => {
                event.ratings = existing.ratings.clone();
                event.media_count = existing.media_count;
            }
            None => {
                event.ratings.clear();
                event.media_count = 0;
            }
        }
        event.host_rating = None;
        tables.events.insert(event.id.clone(), event.clone());
        event
    }

    pub async fn get_event(&self, id: &EventId) -> Option<Event> {
        self.tables.read().await.events.get(id).cloned()
    }

    /// Record a rating; `None` if the event does not exist.
    pub async fn add_rating(
        &self,
        id: &EventId,
        rating: f64,
    ) -> Option<gather_models::ModelResult<Event>> {
        let mut tables = self.tables.write().await;
        let event = tables.events.get_mut(id)?;
        Some(event.add_rating(rating).map(|()| event.clone()))
    }

    /// Events `user_id` could attend: everything they are not hosting, with
    /// each host's average rating filled in.
    pub async fn candidates_for(&self, user_id: &UserId) -> Vec<Event> {
        let tables = self.tables.read().await;

        let mut ratings_by_host: HashMap<&UserId, Vec<f64>> = HashMap::new();
        for event in tables.events.values() {
            ratings_by_host
                .entry(&event.host_id)
                .or_default()
                .extend(event.ratings.iter().copied());
        }

        let mut candidates: Vec<Event> = tables
            .events
            .values()
            .filter(|event| &event.host_id != user_id)
            .map(|event| {
                let mut candidate = event.clone();
                candidate.host_rating = ratings_by_host
                    .get(&event.host_id)
                    .and_then(|ratings| average_rating(ratings));
                candidate
            })
            .collect();

        // Map iteration order is arbitrary; keep ties reproducible
        candidates.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id)));
        candidates
    }

    pub async fn insert_media(&self, record: MediaRecord) {
        self.tables.write().await.media.insert(record.id.clone(), record);
    }

    pub async fn get_media(&self, id: &MediaId) -> Option<MediaRecord> {
        self.tables.read().await.media.get(id).cloned()
    }

    /// Flip a record to available and count it against its event.
    pub async fn mark_media_available(&self, id: &MediaId, outputs: Vec<PathBuf>) {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.media.get_mut(id) else {
            return;
        };
        if record.status == MediaStatus::Available {
            return;
        }
        record.mark_available(outputs);
        let event_id = record.event_id.clone();

        if let Some(event) = tables.events.get_mut(&event_id) {
            event.media_count += 1;
        }
        debug!(media_id = %id, event_id = %event_id, "Media available");
    }

    pub async fn mark_media_failed(&self, id: &MediaId, error: impl Into<String>) {
        if let Some(record) = self.tables.write().await.media.get_mut(id) {
            record.mark_failed(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gather_models::MediaKind;

    #[tokio::test]
    async fn test_user_upsert_keeps_weights() {
        let catalog = Catalog::new();
        let id = UserId::from("u1");
        catalog.upsert_user(User::new("u1", "Ada")).await;
        catalog
            .update_weights(&id, RecommendationWeights::uniform(2.0))
            .await
            .unwrap();

        let replaced = catalog.upsert_user(User::new("u1", "Ada L.")).await;
        assert_eq!(replaced.name, "Ada L.");
        assert_eq!(replaced.weights, RecommendationWeights::uniform(2.0));
    }

    #[tokio::test]
    async fn test_candidates_exclude_own_events_and_average_host() {
        let catalog = Catalog::new();
        catalog.upsert_event(Event::new("past", "host", "Past gig")).await;
        catalog.upsert_event(Event::new("next", "host", "Next gig")).await;
        catalog.upsert_event(Event::new("mine", "u1", "My party")).await;
        for rating in [4.0, 5.0] {
            catalog
                .add_rating(&EventId::from("past"), rating)
                .await
                .unwrap()
                .unwrap();
        }

        let candidates = catalog.candidates_for(&UserId::from("u1")).await;
        let ids: Vec<_> = candidates.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["next", "past"]);
        assert!(candidates.iter().all(|e| e.host_rating == Some(4.5)));
    }

    #[tokio::test]
    async fn test_available_media_counts_once() {
        let catalog = Catalog::new();
        let event_id = EventId::from("e1");
        catalog.upsert_event(Event::new("e1", "host", "Gig")).await;
        let record = MediaRecord::new(event_id.clone(), MediaKind::Image, "/in.png", "/out");
        let media_id = record.id.clone();
        catalog.insert_media(record).await;

        catalog.mark_media_available(&media_id, vec![PathBuf::from("/out/high.jpg")]).await;
        catalog.mark_media_available(&media_id, vec![PathBuf::from("/out/high.jpg")]).await;

        assert_eq!(catalog.get_event(&event_id).await.unwrap().media_count, 1);
        assert!(catalog.get_media(&media_id).await.unwrap().is_available());
    }
}
