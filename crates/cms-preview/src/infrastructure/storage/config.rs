//! TOML-based configuration for the responsive preview.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\CmsPreview\config.toml`
//! - Linux:    `~/.config/cms-preview/config.toml`
//! - macOS:    `~/Library/Application Support/CmsPreview/config.toml`
//!
//! ```toml
//! [preview]
//! log_level = "debug"
//! settle_delay_ms = 50
//! expand_key = "Shift"
//!
//! [storage]
//! path = "/var/lib/cms-preview/store.json"
//!
//! [[devices]]
//! name = "Auto"
//! width = "auto"
//! height = "auto"
//!
//! [[devices]]
//! name = "Pixel 8"
//! width = 412
//! height = 915
//! ```
//!
//! Every field has a default, so an empty or missing file yields the
//! built-in behaviour.  A non-empty `[[devices]]` list replaces the built-in
//! catalog and is validated like it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cms_preview_core::{CatalogError, Device, DeviceCatalog};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::context::{PreviewSettings, PreviewTimings};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The `[[devices]]` list is not a valid catalog.
    #[error("invalid device list: {0}")]
    Catalog(#[from] CatalogError),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Replaces the built-in device catalog when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<Device>,
}

/// Preview behaviour and timing settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Delay after the frame's load event before relay listeners are wired.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Duration of the wrapper resize transition.
    #[serde(default = "default_transition_ms")]
    pub transition_ms: u64,
    /// Scrollbar probe interval when layout notifications are unavailable.
    #[serde(default = "default_scrollbar_poll_ms")]
    pub scrollbar_poll_ms: u64,
    /// Quiet period before overlays re-check the pointer.
    #[serde(default)]
    pub overlay_debounce_ms: u64,
    /// Key toggling expand mode from inside the frame.
    #[serde(default = "default_expand_key")]
    pub expand_key: String,
    /// Language sent with plugin reorder requests.
    #[serde(default = "default_target_language")]
    pub target_language: String,
}

/// Where the persistent key/value store lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// JSON file backing the store.  In-memory when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_settle_delay_ms() -> u64 {
    50
}
fn default_transition_ms() -> u64 {
    150
}
fn default_scrollbar_poll_ms() -> u64 {
    16
}
fn default_expand_key() -> String {
    "Shift".to_string()
}
fn default_target_language() -> String {
    "en".to_string()
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            settle_delay_ms: default_settle_delay_ms(),
            transition_ms: default_transition_ms(),
            scrollbar_poll_ms: default_scrollbar_poll_ms(),
            overlay_debounce_ms: 0,
            expand_key: default_expand_key(),
            target_language: default_target_language(),
        }
    }
}

impl AppConfig {
    /// The configured device catalog, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Catalog`] when `[[devices]]` is not a valid
    /// catalog (first entry not auto-sized, duplicate names).
    pub fn catalog(&self) -> Result<DeviceCatalog, ConfigError> {
        if self.devices.is_empty() {
            return Ok(DeviceCatalog::default());
        }
        Ok(DeviceCatalog::new(self.devices.clone())?)
    }

    pub fn timings(&self) -> PreviewTimings {
        PreviewTimings {
            settle_delay: Duration::from_millis(self.preview.settle_delay_ms),
            transition: Duration::from_millis(self.preview.transition_ms),
            scrollbar_poll: Duration::from_millis(self.preview.scrollbar_poll_ms.max(1)),
            overlay_debounce: Duration::from_millis(self.preview.overlay_debounce_ms),
        }
    }

    pub fn settings(&self) -> PreviewSettings {
        PreviewSettings {
            expand_key: self.preview.expand_key.clone(),
            target_language: self.preview.target_language.clone(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the default location.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the application
/// subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("CmsPreview"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("cms-preview"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("CmsPreview")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("cms_preview_test_{}", Uuid::new_v4()))
            .join("config.toml")
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_timings_match_builtin_timings() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.timings(), PreviewTimings::default());
        assert_eq!(cfg.settings(), PreviewSettings::default());
        assert_eq!(cfg.preview.log_level, "info");
    }

    #[test]
    fn test_empty_device_list_uses_builtin_catalog() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.catalog().unwrap(), DeviceCatalog::default());
    }

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_preview_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[preview]
settle_delay_ms = 120
expand_key = "Alt"
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.timings().settle_delay, Duration::from_millis(120));
        assert_eq!(cfg.settings().expand_key, "Alt");
        // Unspecified fields keep their defaults
        assert_eq!(cfg.timings().transition, Duration::from_millis(150));
    }

    // ── Device overrides ──────────────────────────────────────────────────────

    #[test]
    fn test_custom_devices_replace_catalog() {
        let toml_str = r#"
[[devices]]
name = "Auto"
width = "auto"
height = "auto"

[[devices]]
name = "Pixel 8"
width = 412
height = 915
"#;
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize devices");

        let catalog = cfg.catalog().unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("Pixel 8"), Some(&Device::fixed("Pixel 8", 412, 915)));
    }

    #[test]
    fn test_custom_devices_must_start_with_auto() {
        let toml_str = r#"
[[devices]]
name = "Pixel 8"
width = 412
height = 915
"#;
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize devices");

        assert!(matches!(
            cfg.catalog(),
            Err(ConfigError::Catalog(CatalogError::FirstNotAuto(_)))
        ));
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    // ── Repository ────────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let path = temp_path();
        let mut cfg = AppConfig::default();
        cfg.preview.log_level = "debug".to_string();
        cfg.storage.path = Some(PathBuf::from("/tmp/store.json"));

        // Act
        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped environment is also acceptable.
    }
}
