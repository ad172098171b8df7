//! Notification lifecycle: raise now, expire after a fixed delay.
//!
//! Each raised notification gets its own one-shot timer keyed by id. Expiry is
//! a conditional remove, so a timer firing for an id that is already gone is a no-op.
//! There is no cancellation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::events::GridEvent;
use crate::model::Notification;
use crate::runtime::GridRuntime;
use crate::store::GridStore;

/// Default time a notification stays visible.
pub const DEFAULT_EXPIRY: Duration = Duration::from_millis(5000);

/// Returned by [`NotificationCenter::raise`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationHandle {
    pub id: String,
    pub expires_at: Instant,
}

pub struct NotificationCenter {
    store: Arc<GridStore>,
    runtime: Arc<dyn GridRuntime>,
    expiry: Duration,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl NotificationCenter {
    pub fn new(store: Arc<GridStore>, runtime: Arc<dyn GridRuntime>, expiry: Duration) -> Self {
        Self {
            store,
            runtime,
            expiry,
            timers: Mutex::new(Vec::new()),
        }
    }

    /// Show `message` and schedule its removal.
    ///
    /// Must be called from within a tokio runtime.
    pub fn raise(&self, message: impl Into<String>) -> NotificationHandle {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            msg: message.into(),
        };
        let id = notification.id.clone();

        self.store.push_notification(notification.clone());
        if let Err(e) = self.runtime.emit(GridEvent::NotificationRaised {
            id: notification.id,
            msg: notification.msg,
        }) {
            tracing::debug!("[notify] Failed to emit raise event: {}", e);
        }

        let expires_at = Instant::now() + self.expiry;
        let timer = {
            let store = self.store.clone();
            let runtime = self.runtime.clone();
            let id = id.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(expires_at).await;
                if store.expire_notification(&id) {
                    tracing::debug!("[notify] Expired {}", id);
                    if let Err(e) = runtime.emit(GridEvent::NotificationExpired { id }) {
                        tracing::debug!("[notify] Failed to emit expiry event: {}", e);
                    }
                } else {
                    tracing::trace!("[notify] {} already removed", id);
                }
            })
        };

        let mut timers = self.timers.lock();
        timers.retain(|t| !t.is_finished());
        timers.push(timer);

        NotificationHandle { id, expires_at }
    }

    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.timers.lock().iter().filter(|t| !t.is_finished()).count()
    }

    /// Wait until every notification raised so far has expired.
    pub async fn wait_idle(&self) {
        let timers = std::mem::take(&mut *self.timers.lock());
        for result in futures::future::join_all(timers).await {
            if let Err(e) = result {
                tracing::warn!("[notify] Expiry task failed: {}", e);
            }
        }
    }
}
