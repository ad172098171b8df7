use serde::{Deserialize, Serialize};

use crate::model::Mood;

/// Grid events for front ends.
/// Emitted by the pipeline, the notification manager and geolocation resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridEvent {
    /// Busy flag flipped (loading indicator / input lock)
    BusyChanged { busy: bool },

    /// A submission was turned down because another one is in flight
    SubmissionRejected { reason: String },

    /// The classified insight was merged into the local actor
    InsightRecorded {
        insight_id: String,
        mood: Mood,
        tags: Vec<String>,
        created_actor: bool,
    },

    /// A discovery batch was appended to the connection collection
    ConnectionsEstablished {
        count: usize,
        top_to_id: String,
        top_strength: f64,
    },

    /// A transient alert became visible
    NotificationRaised { id: String, msg: String },

    /// A transient alert was removed by its expiry timer
    NotificationExpired { id: String },

    /// A pipeline stage failed and was recovered locally
    SubmissionFailed { stage: String, message: String },

    /// The pipeline settled (always follows a started submission)
    SubmissionFinished {
        insight_id: Option<String>,
        connections: usize,
    },

    /// Device position resolved at start-up
    PositionResolved { lat: f64, lng: f64, fallback: bool },
}
