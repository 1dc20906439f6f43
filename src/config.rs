//! Application configuration.
//!
//! Loaded from config.json next to the executable (or the `--config` path)
//! at startup. Every field has a default, so a partial file works.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::language::Language;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_language")]
    pub language: Language,
    /// Worker threads; 0 means one per CPU.
    #[serde(default)]
    pub threads: usize,
    /// Explicit Tesseract executable. Searched for when absent.
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default)]
    pub correction_table: Option<PathBuf>,
    /// Dump every cropped region to `debug/<card id>/`.
    #[serde(default)]
    pub save_region_images: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_language() -> Language {
    Language::English
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            threads: 0,
            tesseract_path: None,
            tessdata_dir: None,
            image_dir: default_image_dir(),
            correction_table: None,
            save_region_images: false,
            log_level: default_log_level(),
        }
    }
}

/// Loads configuration from `path` or returns defaults.
///
/// Runs before logging is set up, so problems are reported afterwards through
/// the returned notes.
fn load_config(path: &Path) -> (AppConfig, String) {
    if !path.exists() {
        return (
            AppConfig::default(),
            format!("{} not found, using default config", path.display()),
        );
    }
    match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => (config, format!("Config loaded from {}", path.display())),
            Err(e) => (
                AppConfig::default(),
                format!("Failed to parse {}: {}. Using defaults.", path.display(), e),
            ),
        },
        Err(e) => (
            AppConfig::default(),
            format!("Failed to read {}: {}. Using defaults.", path.display(), e),
        ),
    }
}

/// Initializes the global configuration. Call once at startup; later calls
/// keep the first configuration.
pub fn init_config(path: &Path) -> &'static AppConfig {
    let (config, note) = load_config(path);
    if CONFIG.set(config).is_err() {
        warn!("Config was already initialized, ignoring {}", path.display());
    }
    PENDING_NOTE.get_or_init(|| note);
    get_config()
}

static PENDING_NOTE: OnceLock<String> = OnceLock::new();

/// Logs how the config was loaded. Call once logging is up.
pub fn log_load_result() {
    if let Some(note) = PENDING_NOTE.get() {
        info!("{}", note);
    }
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"language": "fr", "threads": 3, "saveRegionImages": true}"#).unwrap();

        let (config, note) = load_config(&path);
        assert_eq!(config.language, Language::French);
        assert_eq!(config.threads, 3);
        assert!(config.save_region_images);
        assert_eq!(config.image_dir, PathBuf::from("images"));
        assert_eq!(config.log_level, "info");
        assert!(note.starts_with("Config loaded"));
    }

    #[test]
    fn test_missing_or_invalid_config() {
        let dir = tempdir().unwrap();
        let (config, _) = load_config(&dir.path().join("missing.json"));
        assert_eq!(config, AppConfig::default());

        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let (config, note) = load_config(&path);
        assert_eq!(config, AppConfig::default());
        assert!(note.starts_with("Failed to parse"));
    }
}
