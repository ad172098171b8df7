//! Grid data model: actors, insights, connections and notifications.
//!
//! Everything here is plain data. Mutation happens through [`crate::store::GridStore`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reserved actor id of the local user.
pub const LOCAL_USER_ID: &str = "me";

/// Display name stamped on the local user's insights.
pub const LOCAL_USER_NAME: &str = "Me";

/// Display name of the local user's actor when it is created lazily.
pub const LOCAL_ACTOR_NAME: &str = "My Core";

/// A coordinate on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const ORIGIN: GeoPoint = GeoPoint { lat: 0.0, lng: 0.0 };

    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Clamp into `lat ∈ [-90, 90]`, `lng ∈ [-180, 180]`.
    pub fn clamped(lat: f64, lng: f64) -> Self {
        Self {
            lat: lat.clamp(-90.0, 90.0),
            lng: lng.clamp(-180.0, 180.0),
        }
    }

    /// Whether both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// The fixed mood vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Joy,
    Sadness,
    Anger,
    Peace,
    Lonely,
    Inspired,
}

impl Mood {
    pub const ALL: [Mood; 6] = [
        Mood::Joy,
        Mood::Sadness,
        Mood::Anger,
        Mood::Peace,
        Mood::Lonely,
        Mood::Inspired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Joy => "joy",
            Mood::Sadness => "sadness",
            Mood::Anger => "anger",
            Mood::Peace => "peace",
            Mood::Lonely => "lonely",
            Mood::Inspired => "inspired",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mood: {0}")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| UnknownMood(s.to_string()))
    }
}

/// One emotional submission. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub text: String,
    pub mood: Mood,
    pub tags: Vec<String>,
    /// Advisory only; nothing in the core enforces it.
    pub is_public: bool,
    pub timestamp: DateTime<Utc>,
    pub position: GeoPoint,
}

/// A participant on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub position: GeoPoint,
    /// Most recent first.
    pub insights: Vec<Insight>,
}

impl Actor {
    pub fn latest_insight(&self) -> Option<&Insight> {
        self.insights.first()
    }
}

/// A directed, weighted resonance edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from_id: String,
    pub to_id: String,
    pub strength: f64,
    pub reason: String,
}

/// A transient alert shown to the local user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_parse_case_insensitive() {
        assert_eq!("Joy".parse::<Mood>(), Ok(Mood::Joy));
        assert_eq!("  LONELY ".parse::<Mood>(), Ok(Mood::Lonely));
        assert!("melancholy".parse::<Mood>().is_err());
    }

    #[test]
    fn test_mood_serializes_lowercase() {
        let json = serde_json::to_string(&Mood::Inspired).unwrap();
        assert_eq!(json, "\"inspired\"");
    }

    #[test]
    fn test_geo_point_clamped() {
        let p = GeoPoint::clamped(95.0, -200.0);
        assert_eq!(p, GeoPoint::new(90.0, -180.0));
        assert!(p.is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
    }
}
