//! The grid state store.
//!
//! A single `GridStore` owns the actor, connection and notification collections
//! (plus the local friends list). Every mutation is one write-lock critical
//! section, so each entry point is atomic with respect to readers:
//! - `append_insight`
//! - `append_connections`
//! - `push_notification`
//! - `expire_notification`

use parking_lot::RwLock;
use serde::Serialize;

use crate::model::{Actor, Connection, Insight, Notification, LOCAL_ACTOR_NAME, LOCAL_USER_ID};

#[derive(Debug, Default)]
struct GridState {
    actors: Vec<Actor>,
    connections: Vec<Connection>,
    notifications: Vec<Notification>,
    friends: Vec<String>,
}

/// How an insight was merged into the actor collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightMerge {
    /// No actor with the owner id existed; one was created.
    CreatedActor,
    /// The insight became the head of an existing actor's sequence.
    Prepended,
}

/// Counts shown by status views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub actors: usize,
    pub actors_with_insights: usize,
    pub connections: usize,
    pub notifications: usize,
    pub friends: usize,
}

pub struct GridStore {
    state: RwLock<GridState>,
}

impl GridStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GridState::default()),
        }
    }

    /// Create a store seeded with `actors`. Later duplicates of an id are dropped.
    pub fn with_actors(actors: Vec<Actor>) -> Self {
        let store = Self::new();
        store.seed(actors);
        store
    }

    /// Add actors whose ids are not yet present.
    pub fn seed(&self, actors: Vec<Actor>) {
        let mut state = self.state.write();
        for actor in actors {
            if state.actors.iter().any(|a| a.id == actor.id) {
                tracing::warn!("[store] Ignoring duplicate actor id {}", actor.id);
                continue;
            }
            state.actors.push(actor);
        }
    }

    /// Clone of the actor collection as it stands now.
    pub fn actors_snapshot(&self) -> Vec<Actor> {
        self.state.read().actors.clone()
    }

    pub fn actor(&self, id: &str) -> Option<Actor> {
        self.state.read().actors.iter().find(|a| a.id == id).cloned()
    }

    pub fn actor_name(&self, id: &str) -> Option<String> {
        self.state
            .read()
            .actors
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.clone())
    }

    /// Merge an insight into its owner's sequence.
    ///
    /// The existence check and the write happen under one lock, so two merges
    /// for the same owner can never both create the actor.
    pub fn append_insight(&self, insight: Insight) -> InsightMerge {
        let mut state = self.state.write();

        if let Some(actor) = state.actors.iter_mut().find(|a| a.id == insight.user_id) {
            actor.insights.insert(0, insight);
            return InsightMerge::Prepended;
        }

        let name = if insight.user_id == LOCAL_USER_ID {
            LOCAL_ACTOR_NAME.to_string()
        } else {
            insight.user_name.clone()
        };
        state.actors.push(Actor {
            id: insight.user_id.clone(),
            name,
            position: insight.position,
            insights: vec![insight],
        });
        InsightMerge::CreatedActor
    }

    /// Append a whole batch in one update. Returns the new connection count.
    pub fn append_connections(&self, batch: Vec<Connection>) -> usize {
        let mut state = self.state.write();
        state.connections.extend(batch);
        state.connections.len()
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.state.read().connections.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.state.read().connections.len()
    }

    pub fn push_notification(&self, notification: Notification) {
        self.state.write().notifications.push(notification);
    }

    /// Remove the notification with `id`. Returns `false` if it was already gone.
    pub fn expire_notification(&self, id: &str) -> bool {
        let mut state = self.state.write();
        let before = state.notifications.len();
        state.notifications.retain(|n| n.id != id);
        state.notifications.len() != before
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.read().notifications.clone()
    }

    /// Record `actor_id` as a friend. Returns `false` if it already was one.
    pub fn add_friend(&self, actor_id: &str) -> bool {
        let mut state = self.state.write();
        if state.friends.iter().any(|f| f == actor_id) {
            return false;
        }
        state.friends.push(actor_id.to_string());
        true
    }

    pub fn is_friend(&self, actor_id: &str) -> bool {
        self.state.read().friends.iter().any(|f| f == actor_id)
    }

    pub fn summary(&self) -> StoreSummary {
        let state = self.state.read();
        StoreSummary {
            actors: state.actors.len(),
            actors_with_insights: state
                .actors
                .iter()
                .filter(|a| !a.insights.is_empty())
                .count(),
            connections: state.connections.len(),
            notifications: state.notifications.len(),
            friends: state.friends.len(),
        }
    }
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeoPoint, Mood, LOCAL_USER_NAME};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn my_insight(id: &str, position: GeoPoint) -> Insight {
        Insight {
            id: id.to_string(),
            user_id: LOCAL_USER_ID.to_string(),
            user_name: LOCAL_USER_NAME.to_string(),
            text: "hello".to_string(),
            mood: Mood::Joy,
            tags: vec!["hope".to_string()],
            is_public: true,
            timestamp: Utc::now(),
            position,
        }
    }

    fn connection(to: &str) -> Connection {
        Connection {
            from_id: LOCAL_USER_ID.to_string(),
            to_id: to.to_string(),
            strength: 0.5,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn test_first_insight_creates_local_actor() {
        let store = GridStore::new();
        let merge = store.append_insight(my_insight("i1", GeoPoint::new(10.0, 20.0)));

        assert_eq!(merge, InsightMerge::CreatedActor);
        let me = store.actor(LOCAL_USER_ID).unwrap();
        assert_eq!(me.name, LOCAL_ACTOR_NAME);
        assert_eq!(me.position, GeoPoint::new(10.0, 20.0));
        assert_eq!(me.insights.len(), 1);
    }

    #[test]
    fn test_later_insight_prepends_and_keeps_position() {
        let store = GridStore::new();
        store.append_insight(my_insight("i1", GeoPoint::new(10.0, 20.0)));
        let merge = store.append_insight(my_insight("i2", GeoPoint::new(-5.0, 3.0)));

        assert_eq!(merge, InsightMerge::Prepended);
        let me = store.actor(LOCAL_USER_ID).unwrap();
        assert_eq!(me.position, GeoPoint::new(10.0, 20.0));
        let ids: Vec<&str> = me.insights.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i2", "i1"]);
        assert_eq!(store.summary().actors, 1);
    }

    #[test]
    fn test_seed_drops_duplicate_ids() {
        let actor = Actor {
            id: "soul-0".to_string(),
            name: "Kael_1".to_string(),
            position: GeoPoint::ORIGIN,
            insights: vec![],
        };
        let mut dup = actor.clone();
        dup.name = "Other".to_string();

        let store = GridStore::with_actors(vec![actor, dup]);
        assert_eq!(store.summary().actors, 1);
        assert_eq!(store.actor_name("soul-0").as_deref(), Some("Kael_1"));
    }

    #[test]
    fn test_expire_notification_is_idempotent() {
        let store = GridStore::new();
        store.push_notification(Notification {
            id: "a".to_string(),
            msg: "first".to_string(),
        });
        store.push_notification(Notification {
            id: "b".to_string(),
            msg: "second".to_string(),
        });

        assert!(store.expire_notification("a"));
        assert!(!store.expire_notification("a"));
        let remaining = store.notifications();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "b");
    }

    #[test]
    fn test_add_friend_once() {
        let store = GridStore::new();
        assert!(store.add_friend("soul-3"));
        assert!(!store.add_friend("soul-3"));
        assert!(store.is_friend("soul-3"));
        assert!(!store.is_friend("soul-4"));
    }

    #[test]
    fn test_connection_batches_never_observed_partially() {
        const BATCH: usize = 7;
        const ROUNDS: usize = 200;

        let store = Arc::new(GridStore::new());
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let store = store.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    assert_eq!(store.connection_count() % BATCH, 0);
                }
            })
        };

        for round in 0..ROUNDS {
            let batch = (0..BATCH)
                .map(|i| connection(&format!("soul-{}-{}", round, i)))
                .collect();
            store.append_connections(batch);
        }
        done.store(true, Ordering::Release);
        reader.join().unwrap();

        assert_eq!(store.connection_count(), BATCH * ROUNDS);
    }
}
