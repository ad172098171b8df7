//! Settings schema definitions for the grid client.
//!
//! All settings structs use `#[serde(default)]` to allow partial configuration files.
//! Missing fields are filled with sensible defaults.

use serde::{Deserialize, Serialize};

use crate::model::GeoPoint;
use crate::pipeline::{ConcurrencyPolicy, SnapshotPolicy};

/// Root settings structure.
///
/// Loaded from `~/.cosmic-oracle/settings.toml` with environment variable interpolation support.
/// Version field enables future migrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Schema version for migrations
    pub version: u32,

    /// Text-analysis oracle configuration
    pub oracle: OracleSettings,

    /// Mock population seeded at start-up
    pub population: PopulationSettings,

    /// Device position resolution
    pub geolocation: GeolocationSettings,

    /// Transient alerts
    pub notifications: NotificationSettings,

    /// Submission pipeline behaviour
    pub submission: SubmissionSettings,

    /// Advanced/debug settings
    pub advanced: AdvancedSettings,
}

/// Oracle backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    /// Backend: "gemini" | "offline"
    pub provider: String,

    /// Gemini specific settings
    pub gemini: GeminiSettings,

    /// Offline (rule-based) backend settings
    pub offline: OfflineOracleSettings,
}

/// Gemini API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// Gemini API key (supports $ENV_VAR syntax)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model id
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature
    pub temperature: f32,
}

/// Offline oracle tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineOracleSettings {
    /// Minimum resonance (0.0 - 1.0) for a candidate to be returned
    pub min_strength: f64,

    /// Maximum connections returned per discovery
    pub max_connections: usize,
}

/// Mock population settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationSettings {
    /// Number of seeded actors
    pub size: usize,

    /// Probability (0.0 - 1.0) that a seeded actor starts with an insight
    pub insight_probability: f64,

    /// RNG seed for reproducible populations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Geolocation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationSettings {
    /// Resolve the device position at start-up
    pub enabled: bool,

    /// Locator: "ip" | "fixed"
    pub provider: String,

    /// IP geolocation endpoint (must return `latitude` / `longitude`)
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Position used by the "fixed" locator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GeoPoint>,

    /// Position stored when resolution fails
    pub fallback: GeoPoint,
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Time a notification stays visible, in milliseconds
    pub expiry_ms: u64,
}

/// Submission pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SubmissionSettings {
    /// What to do with a submission while another is in flight
    pub concurrency: ConcurrencyPolicy,

    /// When the discovery candidate pool is captured
    pub snapshot: SnapshotPolicy,
}

/// Advanced/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedSettings {
    /// Log level: "error" | "warn" | "info" | "debug" | "trace"
    pub log_level: String,
}

// =============================================================================
// Default implementations
// =============================================================================

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            version: 1,
            oracle: OracleSettings::default(),
            population: PopulationSettings::default(),
            geolocation: GeolocationSettings::default(),
            notifications: NotificationSettings::default(),
            submission: SubmissionSettings::default(),
            advanced: AdvancedSettings::default(),
        }
    }
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            gemini: GeminiSettings::default(),
            offline: OfflineOracleSettings::default(),
        }
    }
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 30,
            temperature: 0.4,
        }
    }
}

impl Default for OfflineOracleSettings {
    fn default() -> Self {
        Self {
            min_strength: 0.35,
            max_connections: 5,
        }
    }
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self {
            size: 400,
            insight_probability: 0.15,
            seed: None,
        }
    }
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "ip".to_string(),
            endpoint: "https://ipapi.co/json/".to_string(),
            timeout_secs: 5,
            position: None,
            fallback: GeoPoint::new(31.23, 121.47),
        }
    }
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { expiry_ms: 5000 }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}
