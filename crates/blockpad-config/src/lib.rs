use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_USER_ID: &str = "local-user";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the workspace file and uploaded images
    pub data_path: PathBuf,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub editor: EditorSettings,
}

/// Editor tuning; every key is optional in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub quiet_period_ms: u64,
    pub max_wait_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub saved_display_ms: u64,
    pub drag_threshold_px: f64,
    pub history_capacity: usize,
    /// Filter the "/" menu by the text typed after the trigger
    pub filter_menu: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            quiet_period_ms: 300,
            max_wait_ms: 2000,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            saved_display_ms: 2000,
            drag_threshold_px: 8.0,
            history_capacity: 100,
            filter_menu: false,
        }
    }
}

impl EditorSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_wait_ms < self.quiet_period_ms {
            return Err(ConfigError::InvalidValue {
                key: "editor.max_wait_ms",
                reason: format!(
                    "{} is shorter than the quiet period of {}",
                    self.max_wait_ms, self.quiet_period_ms
                ),
            });
        }
        if !self.drag_threshold_px.is_finite() || self.drag_threshold_px < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "editor.drag_threshold_px",
                reason: format!("{} is not a distance", self.drag_threshold_px),
            });
        }
        Ok(())
    }
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

impl Config {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            user_id: default_user_id(),
            editor: EditorSettings::default(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.editor.validate()?;

        // Expand shell variables and tilde in the data directory
        config.data_path = Self::expand_path(&config.data_path).unwrap_or(config.data_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/blockpad");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Data directory used when no config file exists yet
    pub fn default_data_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/blockpad");
        PathBuf::from(data_dir.as_ref())
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.data_path.join("uploads")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
