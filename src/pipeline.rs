//! Insight submission and resonance-connection pipeline.
//!
//! One submission runs these steps in order:
//! 1. mark busy
//! 2. classify the text (failure aborts without an insight)
//! 3. build the insight and merge it into the local actor
//! 4. project the candidate pool from the actor snapshot taken before the merge
//! 5. discover connections (failure keeps the insight, records nothing else)
//! 6. append the sanitized batch atomically
//! 7. raise a notification for the strongest resolvable target
//! 8. clear busy, on every path
//!
//! Entry is serialized by a real mutex; see [`ConcurrencyPolicy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::candidates::snapshot_candidates;
use crate::error::{PipelineError, Result};
use crate::events::GridEvent;
use crate::geolocation::CurrentPosition;
use crate::model::{Actor, Connection, Insight, LOCAL_USER_ID, LOCAL_USER_NAME};
use crate::notifications::{NotificationCenter, NotificationHandle};
use crate::oracle::{sanitize_candidates, sanitize_tags, ConnectionCandidate, Oracle};
use crate::runtime::GridRuntime;
use crate::settings::schema::SubmissionSettings;
use crate::store::{GridStore, InsightMerge};

/// What happens to a submission while another one is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Turn it down immediately
    #[default]
    Reject,
    /// Wait for the running one to settle
    Queue,
}

/// When `submit` captures the actor snapshot for the candidate pool.
///
/// Either way the pool is taken before the new insight is merged, so the
/// local actor never sees its own fresh insight. The difference is whether
/// insights that arrive during the classify await are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPolicy {
    /// Before classification starts
    #[default]
    AtInvocation,
    /// After classification returns, immediately before the merge
    AfterClassify,
}

/// How the discovery stage of a recorded submission ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Discovery {
    /// Nobody else had an insight; the oracle was not asked
    NoCandidates,
    /// The oracle call failed; nothing was recorded
    Failed,
    /// The oracle found nothing (or only malformed candidates)
    NoResonance,
    /// A batch was appended
    Connected {
        top_to_id: String,
        top_strength: f64,
        /// Whether the top target was found in the actor collection
        resolved: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReport {
    pub insight: Insight,
    pub created_actor: bool,
    pub discovery: Discovery,
    pub connections: Vec<Connection>,
    pub notification: Option<NotificationHandle>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Another submission held the pipeline
    Rejected,
    /// The oracle could not classify the text; nothing changed
    ClassificationFailed,
    /// An insight was created
    Recorded(SubmissionReport),
}

impl SubmitOutcome {
    pub fn report(&self) -> Option<&SubmissionReport> {
        match self {
            SubmitOutcome::Recorded(report) => Some(report),
            _ => None,
        }
    }
}

/// Highest strength first; ties go to the lowest `to_id`.
pub fn select_top(candidates: &[ConnectionCandidate]) -> Option<&ConnectionCandidate> {
    candidates.iter().min_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| a.to_id.cmp(&b.to_id))
    })
}

/// Sets the busy flag for its lifetime.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    runtime: &'a dyn GridRuntime,
}

impl<'a> BusyGuard<'a> {
    fn enter(busy: &'a AtomicBool, runtime: &'a dyn GridRuntime) -> Self {
        busy.store(true, Ordering::SeqCst);
        emit(runtime, GridEvent::BusyChanged { busy: true });
        Self { busy, runtime }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
        emit(self.runtime, GridEvent::BusyChanged { busy: false });
    }
}

fn emit(runtime: &dyn GridRuntime, event: GridEvent) {
    if let Err(e) = runtime.emit(event) {
        tracing::debug!("[pipeline] Failed to emit event: {}", e);
    }
}

pub struct SubmissionPipeline {
    store: Arc<GridStore>,
    oracle: Arc<dyn Oracle>,
    notifications: Arc<NotificationCenter>,
    position: Arc<CurrentPosition>,
    runtime: Arc<dyn GridRuntime>,
    settings: SubmissionSettings,
    gate: Mutex<()>,
    busy: AtomicBool,
}

impl SubmissionPipeline {
    pub fn new(
        store: Arc<GridStore>,
        oracle: Arc<dyn Oracle>,
        notifications: Arc<NotificationCenter>,
        position: Arc<CurrentPosition>,
        runtime: Arc<dyn GridRuntime>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            store,
            oracle,
            notifications,
            position,
            runtime,
            settings,
            gate: Mutex::new(()),
            busy: AtomicBool::new(false),
        }
    }

    /// Whether a submission is currently running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Submit free text; the candidate snapshot follows the configured [`SnapshotPolicy`].
    pub async fn submit(&self, text: &str, is_public: bool) -> SubmitOutcome {
        let Some(_permit) = self.acquire().await else {
            return self.reject();
        };

        let snapshot = match self.settings.snapshot {
            SnapshotPolicy::AtInvocation => Some(self.store.actors_snapshot()),
            SnapshotPolicy::AfterClassify => None,
        };
        self.run_guarded(text, is_public, snapshot).await
    }

    /// Submit free text with an explicit candidate snapshot.
    pub async fn submit_with_snapshot(
        &self,
        text: &str,
        is_public: bool,
        snapshot: Vec<Actor>,
    ) -> SubmitOutcome {
        let Some(_permit) = self.acquire().await else {
            return self.reject();
        };
        self.run_guarded(text, is_public, Some(snapshot)).await
    }

    async fn acquire(&self) -> Option<MutexGuard<'_, ()>> {
        match self.settings.concurrency {
            ConcurrencyPolicy::Reject => self.gate.try_lock().ok(),
            ConcurrencyPolicy::Queue => Some(self.gate.lock().await),
        }
    }

    fn reject(&self) -> SubmitOutcome {
        tracing::info!("[pipeline] Submission rejected: another one is in flight");
        emit(
            &*self.runtime,
            GridEvent::SubmissionRejected {
                reason: "a submission is already in flight".to_string(),
            },
        );
        SubmitOutcome::Rejected
    }

    async fn run_guarded(
        &self,
        text: &str,
        is_public: bool,
        snapshot: Option<Vec<Actor>>,
    ) -> SubmitOutcome {
        let _busy = BusyGuard::enter(&self.busy, &*self.runtime);

        match self.run(text, is_public, snapshot).await {
            Ok(report) => {
                emit(
                    &*self.runtime,
                    GridEvent::SubmissionFinished {
                        insight_id: Some(report.insight.id.clone()),
                        connections: report.connections.len(),
                    },
                );
                SubmitOutcome::Recorded(report)
            }
            Err(e) => {
                self.report_failure(&e);
                emit(
                    &*self.runtime,
                    GridEvent::SubmissionFinished {
                        insight_id: None,
                        connections: 0,
                    },
                );
                SubmitOutcome::ClassificationFailed
            }
        }
    }

    fn report_failure(&self, error: &PipelineError) {
        tracing::warn!("[pipeline] {}", error);
        emit(
            &*self.runtime,
            GridEvent::SubmissionFailed {
                stage: error.stage().to_string(),
                message: error.to_string(),
            },
        );
    }

    async fn run(
        &self,
        text: &str,
        is_public: bool,
        snapshot: Option<Vec<Actor>>,
    ) -> Result<SubmissionReport> {
        let classification = self
            .oracle
            .classify(text)
            .await
            .map_err(PipelineError::Classification)?;

        let insight = Insight {
            id: Uuid::new_v4().to_string(),
            user_id: LOCAL_USER_ID.to_string(),
            user_name: LOCAL_USER_NAME.to_string(),
            text: text.to_string(),
            mood: classification.mood,
            tags: sanitize_tags(classification.tags),
            is_public,
            timestamp: Utc::now(),
            position: self.position.or_origin(),
        };

        // Pre-merge actor state
        let snapshot = snapshot.unwrap_or_else(|| self.store.actors_snapshot());

        let created_actor = self.store.append_insight(insight.clone()) == InsightMerge::CreatedActor;
        tracing::info!(
            "[pipeline] Recorded insight {} ({}, tags: {:?})",
            insight.id,
            insight.mood,
            insight.tags
        );
        emit(
            &*self.runtime,
            GridEvent::InsightRecorded {
                insight_id: insight.id.clone(),
                mood: insight.mood,
                tags: insight.tags.clone(),
                created_actor,
            },
        );

        let mut report = SubmissionReport {
            insight,
            created_actor,
            discovery: Discovery::NoCandidates,
            connections: Vec::new(),
            notification: None,
        };

        let pool = snapshot_candidates(&snapshot, LOCAL_USER_ID);
        if pool.is_empty() {
            tracing::debug!("[pipeline] No candidates with insights, skipping discovery");
            return Ok(report);
        }

        let candidates = match self.discover(&report.insight, &pool).await {
            Ok(candidates) => candidates,
            Err(e) => {
                self.report_failure(&e);
                report.discovery = Discovery::Failed;
                return Ok(report);
            }
        };

        let Some(top) = select_top(&candidates).cloned() else {
            tracing::debug!("[pipeline] Oracle found no resonance among {} candidates", pool.len());
            report.discovery = Discovery::NoResonance;
            return Ok(report);
        };

        let batch: Vec<Connection> = candidates
            .into_iter()
            .map(|c| Connection {
                from_id: LOCAL_USER_ID.to_string(),
                to_id: c.to_id,
                strength: c.strength,
                reason: c.reason,
            })
            .collect();
        let total = self.store.append_connections(batch.clone());
        tracing::info!(
            "[pipeline] Appended {} connection(s), {} total",
            batch.len(),
            total
        );
        emit(
            &*self.runtime,
            GridEvent::ConnectionsEstablished {
                count: batch.len(),
                top_to_id: top.to_id.clone(),
                top_strength: top.strength,
            },
        );

        report.notification = match self.store.actor_name(&top.to_id) {
            Some(name) => Some(
                self.notifications
                    .raise(format!("Stable Connection Established with {}", name)),
            ),
            None => {
                tracing::debug!("[pipeline] Top target {} not in actor collection", top.to_id);
                None
            }
        };
        report.discovery = Discovery::Connected {
            top_to_id: top.to_id,
            top_strength: top.strength,
            resolved: report.notification.is_some(),
        };
        report.connections = batch;

        Ok(report)
    }

    async fn discover(
        &self,
        insight: &Insight,
        pool: &[Insight],
    ) -> Result<Vec<ConnectionCandidate>> {
        let raw = self
            .oracle
            .discover_connections(insight, pool)
            .await
            .map_err(PipelineError::Discovery)?;
        Ok(sanitize_candidates(raw, &insight.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(to_id: &str, strength: f64) -> ConnectionCandidate {
        ConnectionCandidate {
            to_id: to_id.to_string(),
            strength,
            reason: String::new(),
        }
    }

    #[test]
    fn test_select_top_highest_strength() {
        let candidates = vec![candidate("soul-1", 0.4), candidate("soul-2", 0.9), candidate("soul-3", 0.5)];
        assert_eq!(select_top(&candidates).unwrap().to_id, "soul-2");
    }

    #[test]
    fn test_select_top_tie_breaks_on_lowest_id() {
        let candidates = vec![candidate("soul-9", 0.8), candidate("soul-10", 0.8), candidate("soul-2", 0.1)];
        assert_eq!(select_top(&candidates).unwrap().to_id, "soul-10");
    }

    #[test]
    fn test_select_top_empty() {
        assert!(select_top(&[]).is_none());
    }

    #[test]
    fn test_policies_deserialize_snake_case() {
        let c: ConcurrencyPolicy = serde_json::from_str("\"queue\"").unwrap();
        assert_eq!(c, ConcurrencyPolicy::Queue);
        let s: SnapshotPolicy = serde_json::from_str("\"after_classify\"").unwrap();
        assert_eq!(s, SnapshotPolicy::AfterClassify);
    }
}
