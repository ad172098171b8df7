//! Text-analysis oracle boundary.
//!
//! The pipeline depends only on the [`Oracle`] trait. Two backends ship with the crate:
//! - [`GeminiOracle`]: Gemini `generateContent` with JSON response schemas
//! - [`OfflineOracle`]: keyword lexicon and mood/tag overlap, no network
//!
//! Whatever a backend returns is treated as untrusted input: the pipeline runs
//! [`sanitize_tags`] and [`sanitize_candidates`] before anything reaches the store.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Insight, Mood};
use crate::settings::get_with_env_fallback;
use crate::settings::schema::OracleSettings;

pub mod gemini;
pub mod offline;
pub mod prompts;

pub use gemini::GeminiOracle;
pub use offline::OfflineOracle;

/// Errors that can occur when talking to an oracle backend.
#[derive(Debug, Error)]
pub enum OracleError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Response parsed but has the wrong shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Backend is missing configuration
    #[error("Oracle not configured: {0}")]
    NotConfigured(String),
}

impl From<serde_json::Error> for OracleError {
    fn from(err: serde_json::Error) -> Self {
        OracleError::Parse(err.to_string())
    }
}

/// Mood and tags for one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub mood: Mood,
    pub tags: Vec<String>,
}

/// One resonance candidate as returned by the oracle (unvalidated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCandidate {
    pub to_id: String,
    pub strength: f64,
    pub reason: String,
}

/// External text-analysis and connection-discovery service.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Classify free text into a mood and a set of tags.
    async fn classify(&self, text: &str) -> Result<Classification, OracleError>;

    /// Rank `candidates` by resonance with `insight`. An empty result means none found.
    async fn discover_connections(
        &self,
        insight: &Insight,
        candidates: &[Insight],
    ) -> Result<Vec<ConnectionCandidate>, OracleError>;

    /// Get a description of this backend for logging
    fn description(&self) -> String;
}

/// Trim tags, drop empty ones and duplicates (first occurrence wins).
pub fn sanitize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

/// Drop candidates with an empty target, a target equal to `exclude_id` (the submitter),
/// or a non-finite strength; clamp the rest into `[0, 1]`.
pub fn sanitize_candidates(
    candidates: Vec<ConnectionCandidate>,
    exclude_id: &str,
) -> Vec<ConnectionCandidate> {
    candidates
        .into_iter()
        .filter_map(|mut c| {
            c.to_id = c.to_id.trim().to_string();
            if c.to_id.is_empty() || c.to_id == exclude_id || !c.strength.is_finite() {
                tracing::debug!("[oracle] Dropping malformed candidate: {:?}", c);
                return None;
            }
            c.strength = c.strength.clamp(0.0, 1.0);
            Some(c)
        })
        .collect()
}

/// Create an oracle from settings.
///
/// Falls back to the offline backend when Gemini has no API key.
pub fn create_oracle(settings: &OracleSettings, api_key_override: Option<&str>) -> Arc<dyn Oracle> {
    match settings.provider.as_str() {
        "gemini" => {
            let api_key = api_key_override.map(str::to_string).or_else(|| {
                get_with_env_fallback(
                    &settings.gemini.api_key,
                    &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
                    None,
                )
            });

            let Some(api_key) = api_key else {
                tracing::warn!("[oracle] No Gemini API key configured, using offline oracle");
                return Arc::new(OfflineOracle::from_settings(&settings.offline));
            };

            match GeminiOracle::from_settings(&settings.gemini, &api_key) {
                Ok(oracle) => {
                    tracing::info!("[oracle] Using {}", oracle.description());
                    Arc::new(oracle)
                }
                Err(e) => {
                    tracing::warn!("[oracle] Failed to create Gemini client, using offline: {}", e);
                    Arc::new(OfflineOracle::from_settings(&settings.offline))
                }
            }
        }
        other => {
            if other != "offline" {
                tracing::warn!("[oracle] Unknown provider '{}', using offline oracle", other);
            }
            Arc::new(OfflineOracle::from_settings(&settings.offline))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(to_id: &str, strength: f64) -> ConnectionCandidate {
        ConnectionCandidate {
            to_id: to_id.to_string(),
            strength,
            reason: "r".to_string(),
        }
    }

    #[test]
    fn test_sanitize_tags() {
        let tags = vec![
            " hope ".to_string(),
            "".to_string(),
            "Hope".to_string(),
            "cosmos".to_string(),
        ];
        assert_eq!(sanitize_tags(tags), vec!["hope", "cosmos"]);
    }

    #[test]
    fn test_sanitize_candidates_drops_malformed() {
        let cleaned = sanitize_candidates(vec![
            candidate("soul-1", 1.7),
            candidate("  ", 0.4),
            candidate("soul-2", f64::NAN),
            candidate("soul-3", -0.2),
            candidate("soul-4", f64::INFINITY),
        ], "me");

        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].to_id, "soul-1");
        assert_eq!(cleaned[0].strength, 1.0);
        assert_eq!(cleaned[1].to_id, "soul-3");
        assert_eq!(cleaned[1].strength, 0.0);
    }

    #[test]
    fn test_sanitize_candidates_drops_submitter() {
        let cleaned = sanitize_candidates(
            vec![candidate("me", 0.95), candidate(" me ", 0.9), candidate("soul-1", 0.5)],
            "me",
        );
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].to_id, "soul-1");
    }

    #[test]
    fn test_candidate_wire_format_is_camel_case() {
        let parsed: Vec<ConnectionCandidate> =
            serde_json::from_str(r#"[{"toId":"soul-7","strength":0.8,"reason":"shared joy"}]"#)
                .unwrap();
        assert_eq!(parsed[0].to_id, "soul-7");
    }

    #[test]
    fn test_create_oracle_offline_by_name() {
        let mut settings = OracleSettings::default();
        settings.provider = "offline".to_string();
        let oracle = create_oracle(&settings, None);
        assert!(oracle.description().starts_with("Offline"));
    }

    #[test]
    fn test_create_oracle_gemini_with_override_key() {
        let mut settings = OracleSettings::default();
        settings.provider = "gemini".to_string();
        let oracle = create_oracle(&settings, Some("test-key"));
        assert!(oracle.description().starts_with("Gemini"));
    }

    proptest! {
        #[test]
        fn prop_sanitized_strength_in_unit_range(s in proptest::num::f64::ANY) {
            for c in sanitize_candidates(vec![candidate("soul-1", s)], "me") {
                prop_assert!((0.0..=1.0).contains(&c.strength));
            }
        }
    }
}
