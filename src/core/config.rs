/*
 * Configuration for the soft input dialog: the fixed captions, the layout
 * constants in dialog units, an optional dialog font, and the log level used
 * by hosts that let this crate set up logging.
 *
 * Settings are persisted as JSON in the application's local configuration
 * directory. Storage goes through the `ConfigManagerOperations` trait so hosts
 * and tests can substitute their own backend; `CoreConfigManager` is the file
 * implementation. A missing file yields the defaults.
 */
use crate::core::dialog_template::TemplateFont;
use crate::core::geometry::LayoutMetrics;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "soft_input_config.json";

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    NoProjectDirectory,
    Json(serde_json::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::NoProjectDirectory => {
                write!(f, "Could not determine the configuration directory")
            }
            ConfigError::Json(e) => write!(f, "Configuration file format error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
            ConfigError::NoProjectDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontConfig {
    pub point_size: u16,
    pub face_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftInputConfig {
    pub title: String,
    pub ok_caption: String,
    pub cancel_caption: String,
    pub dialog_height_dlu: i32,
    pub margin_x_dlu: i32,
    pub margin_y_dlu: i32,
    pub font: Option<FontConfig>,
    pub log_level: String,
}

impl Default for SoftInputConfig {
    fn default() -> Self {
        let metrics = LayoutMetrics::default();
        SoftInputConfig {
            title: "Edit text".to_string(),
            ok_caption: "OK".to_string(),
            cancel_caption: "Cancel".to_string(),
            dialog_height_dlu: metrics.dialog_height,
            margin_x_dlu: metrics.margin_x,
            margin_y_dlu: metrics.margin_y,
            font: None,
            log_level: "info".to_string(),
        }
    }
}

impl SoftInputConfig {
    pub fn layout_metrics(&self) -> LayoutMetrics {
        LayoutMetrics {
            dialog_height: self.dialog_height_dlu,
            margin_x: self.margin_x_dlu,
            margin_y: self.margin_y_dlu,
        }
    }

    pub fn template_font(&self) -> Option<TemplateFont> {
        self.font.as_ref().map(|font| TemplateFont {
            point_size: font.point_size,
            face_name: font.face_name.clone(),
        })
    }

    /// The configured log level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

pub trait ConfigManagerOperations: Send + Sync {
    fn load_config(&self, app_name: &str) -> Result<SoftInputConfig>;
    fn save_config(&self, app_name: &str, config: &SoftInputConfig) -> Result<()>;
}

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it if necessary. Returns `None` if no home directory can be
 * determined or the directory cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", app_name)?;
    let config_path = proj_dirs.config_local_dir();
    if !config_path.exists() {
        if let Err(e) = fs::create_dir_all(config_path) {
            log::error!(
                "Config: Failed to create config directory {:?}: {}",
                config_path,
                e
            );
            return None;
        }
        log::debug!("Config: Created config directory {:?}", config_path);
    }
    Some(config_path.to_path_buf())
}

/// File-backed configuration storage.
#[derive(Debug, Default)]
pub struct CoreConfigManager {
    base_dir: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager { base_dir: None }
    }

    /// Stores configuration under `base_dir` instead of the per-user directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        CoreConfigManager {
            base_dir: Some(base_dir.into()),
        }
    }

    fn config_dir(&self, app_name: &str) -> Result<PathBuf> {
        match &self.base_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                Ok(dir.clone())
            }
            None => get_base_app_config_local_dir(app_name).ok_or(ConfigError::NoProjectDirectory),
        }
    }

    pub fn config_file_path(&self, app_name: &str) -> Result<PathBuf> {
        Ok(self.config_dir(app_name)?.join(CONFIG_FILENAME))
    }
}

fn read_config_file(file_path: &Path) -> Result<SoftInputConfig> {
    let contents = fs::read_to_string(file_path)?;
    if contents.trim().is_empty() {
        log::debug!("CoreConfigManager: Config file {file_path:?} is empty, using defaults.");
        return Ok(SoftInputConfig::default());
    }
    Ok(serde_json::from_str(&contents)?)
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_config(&self, app_name: &str) -> Result<SoftInputConfig> {
        log::trace!("CoreConfigManager: Loading config for app '{app_name}'");
        let file_path = self.config_file_path(app_name)?;
        if !file_path.exists() {
            log::debug!("CoreConfigManager: Config file {file_path:?} does not exist, using defaults.");
            return Ok(SoftInputConfig::default());
        }
        let config = read_config_file(&file_path)?;
        log::debug!("CoreConfigManager: Loaded config from {file_path:?}.");
        Ok(config)
    }

    fn save_config(&self, app_name: &str, config: &SoftInputConfig) -> Result<()> {
        let file_path = self.config_file_path(app_name)?;
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&file_path, json)?;
        log::debug!("CoreConfigManager: Saved config to {file_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path());
        let config = manager.load_config("AnyApp").unwrap();
        assert_eq!(config, SoftInputConfig::default());
        assert_eq!(config.title, "Edit text");
        assert_eq!(config.layout_metrics(), LayoutMetrics::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path());
        let config = SoftInputConfig {
            title: "Enter PIN".to_string(),
            dialog_height_dlu: 80,
            font: Some(FontConfig {
                point_size: 9,
                face_name: "Segoe UI".to_string(),
            }),
            log_level: "debug".to_string(),
            ..Default::default()
        };
        manager.save_config("AnyApp", &config).unwrap();

        let loaded = manager.load_config("AnyApp").unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.level_filter(), log::LevelFilter::Debug);
        assert_eq!(loaded.template_font().unwrap().point_size, 9);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), r#"{ "ok_caption": "Done" }"#).unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path());

        let loaded = manager.load_config("AnyApp").unwrap();
        assert_eq!(loaded.ok_caption, "Done");
        assert_eq!(loaded.cancel_caption, "Cancel");
        assert_eq!(loaded.margin_y_dlu, 20);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path());

        match manager.load_config("AnyApp") {
            Err(ConfigError::Json(_)) => {}
            other => panic!("Expected a JSON error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "  \n").unwrap();
        let manager = CoreConfigManager::with_base_dir(dir.path());
        assert_eq!(
            manager.load_config("AnyApp").unwrap(),
            SoftInputConfig::default()
        );
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config = SoftInputConfig {
            log_level: "chatty".to_string(),
            ..Default::default()
        };
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }
}
