//! Settings loading and environment variable interpolation.
//!
//! The `SettingsManager` handles:
//! - Loading settings from `~/.cosmic-oracle/settings.toml`
//! - Resolving `$VAR` and `${VAR}` environment variable references
//! - First-run template generation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use super::schema::GridSettings;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cosmic-oracle")
        .join("settings.toml")
}

/// Manages settings loading and interpolation.
pub struct SettingsManager {
    /// Cached settings (with env vars resolved)
    settings: RwLock<GridSettings>,

    /// Path to the settings file
    path: PathBuf,
}

impl SettingsManager {
    /// Create a new SettingsManager, loading from the default path if available.
    pub async fn new() -> Result<Self> {
        Self::with_path(settings_path()).await
    }

    /// Create a SettingsManager backed by an explicit file.
    pub async fn with_path(path: PathBuf) -> Result<Self> {
        let settings = Self::load_from_path(&path).await?;

        Ok(Self {
            settings: RwLock::new(settings),
            path,
        })
    }

    /// Load settings from a specific path.
    async fn load_from_path(path: &Path) -> Result<GridSettings> {
        if !path.exists() {
            tracing::debug!("Settings file not found at {:?}, using defaults", path);
            return Ok(GridSettings::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read settings file")?;

        // Parse into typed struct
        let mut settings: GridSettings =
            toml::from_str(&contents).context("Failed to deserialize settings")?;

        // Resolve environment variable references
        Self::resolve_env_vars(&mut settings);

        tracing::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Resolve $ENV_VAR references in string fields.
    ///
    /// An unresolved reference is cleared so it never reaches an API as a literal.
    fn resolve_env_vars(settings: &mut GridSettings) {
        fn resolve_opt(value: &mut Option<String>) {
            if let Some(v) = value {
                if v.trim().starts_with('$') {
                    *value = resolve_env_ref(v);
                }
            }
        }

        resolve_opt(&mut settings.oracle.gemini.api_key);
    }

    /// Get the current settings (read-only).
    pub async fn get(&self) -> GridSettings {
        self.settings.read().await.clone()
    }

    /// Get a specific setting by dot-notation key (e.g., "oracle.gemini.model").
    pub async fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        let settings = self.settings.read().await;
        let json = serde_json::to_value(&*settings)?;

        // Navigate by key path
        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow::anyhow!("Setting '{}' not found", key))?;
        }

        Ok(current.clone())
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure settings file exists, creating from template if needed.
    ///
    /// Returns `true` if a new file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false); // Already exists
        }

        // Create parent directory
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write template
        tokio::fs::write(&self.path, TEMPLATE).await?;
        tracing::info!("Generated settings template at {:?}", self.path);
        Ok(true) // Created new file
    }
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var exists.
/// Returns `None` if no env var reference or env var not set.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();

    // Check for $VAR_NAME format
    if let Some(rest) = trimmed.strip_prefix('$') {
        let var_name = rest
            .strip_prefix('{')
            .and_then(|r| r.strip_suffix('}'))
            .unwrap_or(rest);

        return std::env::var(var_name).ok();
    }

    None
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    // 1. Check settings value
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    // 2. Check environment variables
    for env_var in env_vars {
        if let Ok(v) = std::env::var(env_var) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }

    // 3. Return default
    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_env_vars_gemini_key() {
        std::env::set_var("COSMIC_TEST_RESOLVE_KEY", "resolved");

        let mut settings = GridSettings::default();
        settings.oracle.gemini.api_key = Some("  $COSMIC_TEST_RESOLVE_KEY ".to_string());
        SettingsManager::resolve_env_vars(&mut settings);
        assert_eq!(settings.oracle.gemini.api_key.as_deref(), Some("resolved"));

        // A literal key is left alone
        settings.oracle.gemini.api_key = Some("AIza-literal".to_string());
        SettingsManager::resolve_env_vars(&mut settings);
        assert_eq!(settings.oracle.gemini.api_key.as_deref(), Some("AIza-literal"));

        // An unset reference is cleared rather than sent as "$NAME"
        settings.oracle.gemini.api_key = Some("${COSMIC_TEST_UNSET_KEY_4242}".to_string());
        SettingsManager::resolve_env_vars(&mut settings);
        assert_eq!(settings.oracle.gemini.api_key, None);

        std::env::remove_var("COSMIC_TEST_RESOLVE_KEY");
    }

    #[test]
    fn test_gemini_key_env_chain_order() {
        std::env::set_var("COSMIC_TEST_PRIMARY_KEY", "primary");
        std::env::set_var("COSMIC_TEST_SECONDARY_KEY", "secondary");
        let chain = ["COSMIC_TEST_PRIMARY_KEY", "COSMIC_TEST_SECONDARY_KEY"];

        // Configured key wins over the environment
        let configured = Some("configured".to_string());
        assert_eq!(
            get_with_env_fallback(&configured, &chain, None).as_deref(),
            Some("configured")
        );

        // A cleared or empty key falls through to the first variable set
        assert_eq!(get_with_env_fallback(&None, &chain, None).as_deref(), Some("primary"));
        assert_eq!(
            get_with_env_fallback(&Some(String::new()), &chain[1..], None).as_deref(),
            Some("secondary")
        );

        std::env::remove_var("COSMIC_TEST_PRIMARY_KEY");
        std::env::remove_var("COSMIC_TEST_SECONDARY_KEY");
        assert_eq!(get_with_env_fallback(&None, &chain, None), None);
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let manager = SettingsManager::with_path(PathBuf::from("/nonexistent/settings.toml"))
            .await
            .unwrap();

        let settings = manager.get().await;
        assert_eq!(settings.version, 1);
        assert_eq!(settings.oracle.provider, "gemini");
    }

    #[tokio::test]
    async fn test_get_value_by_dot_path() {
        let manager = SettingsManager::with_path(PathBuf::from("/nonexistent/settings.toml"))
            .await
            .unwrap();

        let value = manager.get_value("oracle.gemini.model").await.unwrap();
        assert_eq!(value, serde_json::json!("gemini-2.5-flash"));

        let value = manager.get_value("notifications.expiry_ms").await.unwrap();
        assert_eq!(value, serde_json::json!(5000));

        assert!(manager.get_value("oracle.nope").await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_settings_file_writes_template_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.toml");
        let manager = SettingsManager::with_path(path.clone()).await.unwrap();

        assert!(manager.ensure_settings_file().await.unwrap());
        assert!(!manager.ensure_settings_file().await.unwrap());
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[oracle.gemini]"));
    }

    #[tokio::test]
    async fn test_load_resolves_api_key_from_env() {
        std::env::set_var("COSMIC_TEST_GEMINI_KEY", "secret");
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[oracle.gemini]\napi_key = \"${COSMIC_TEST_GEMINI_KEY}\"\n\n[oracle.offline]\nmax_connections = 2\n",
        )
        .unwrap();

        let settings = SettingsManager::with_path(path).await.unwrap().get().await;
        assert_eq!(settings.oracle.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(settings.oracle.offline.max_connections, 2);

        std::env::remove_var("COSMIC_TEST_GEMINI_KEY");
    }

    #[tokio::test]
    async fn test_load_clears_unresolved_reference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[oracle.gemini]\napi_key = \"$COSMIC_UNSET_VAR_98765\"\n",
        )
        .unwrap();

        let settings = SettingsManager::with_path(path).await.unwrap().get().await;
        assert_eq!(settings.oracle.gemini.api_key, None);
    }
}
