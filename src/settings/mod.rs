//! Centralized TOML-based settings for the grid client.
//!
//! Settings are loaded from `~/.cosmic-oracle/settings.toml` with environment
//! variable interpolation support. Secrets can also come straight from the
//! environment through the `get_with_env_fallback` helper.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::settings::{SettingsManager, get_with_env_fallback};
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get().await;
//!
//! let api_key = get_with_env_fallback(
//!     &settings.oracle.gemini.api_key,
//!     &["GEMINI_API_KEY"],
//!     None,
//! );
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, SettingsManager};
pub use schema::GridSettings;
