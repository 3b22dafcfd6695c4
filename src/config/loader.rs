use super::PluginConfig;
use crate::errors::ConfigError;
use std::{env, fs, path::{Path, PathBuf}};

pub const USER_CONFIG_PATH: &str = "~/.config/hostdi";
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_LOG_LEVEL: &str = "HOSTDI_LOG_LEVEL";
pub const ENV_PANEL_NAME: &str = "HOSTDI_PANEL";

/// Configuration loader responsible for loading config from files and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with the default path
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Create a config loader reading an explicit file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// `~/.config/hostdi/config.toml`, tilde expanded
    pub fn default_path() -> PathBuf {
        let expanded = shellexpand::tilde(USER_CONFIG_PATH);
        let base = if expanded.starts_with('~') {
            // 无法展开时退回到平台配置目录
            dirs::config_dir()
                .map(|dir| dir.join("hostdi"))
                .unwrap_or_else(|| PathBuf::from(expanded.as_ref()))
        } else {
            PathBuf::from(expanded.as_ref())
        };
        base.join(CONFIG_FILE_NAME)
    }

    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Self::default_path)
    }

    /// Load configuration, then apply environment overrides
    ///
    /// A missing default file yields the defaults. A missing explicit file is an error.
    pub fn load(&self) -> Result<PluginConfig, ConfigError> {
        let path = self.path();
        let mut config = if path.exists() || self.path.is_some() {
            self.load_file(&path)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            PluginConfig::default()
        };

        apply_env_overrides(&mut config, |key| env::var(key).ok());
        config.logging.level()?;
        Ok(config)
    }

    fn load_file(&self, path: &Path) -> Result<PluginConfig, ConfigError> {
        let display = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(display.clone(), e))?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::TomlParse(display.clone(), e))?;
        tracing::debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }
}

/// Overrides from `HOSTDI_LOG_LEVEL` and `HOSTDI_PANEL`
pub fn apply_env_overrides<F>(config: &mut PluginConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
        config.logging.level = level;
    }
    if let Some(panel) = lookup(ENV_PANEL_NAME).filter(|v| !v.trim().is_empty()) {
        config.ui.panel_name = panel;
    }
}
