//! Discovery candidate pool selection.

use crate::model::{Actor, Insight};

/// Head insight of every actor other than `exclude_id` that has at least one insight.
///
/// Output order follows `actors`; ranking is left to the oracle.
pub fn snapshot_candidates(actors: &[Actor], exclude_id: &str) -> Vec<Insight> {
    actors
        .iter()
        .filter(|actor| actor.id != exclude_id)
        .filter_map(|actor| actor.latest_insight().cloned())
        .collect()
}
