pub mod loader;

pub use loader::{ConfigLoader, CONFIG_FILE_NAME, USER_CONFIG_PATH};

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PANEL_NAME: &str = "Host DI";

/// Plugin configuration, loaded from `config.toml`.
///
/// Every section is optional; missing sections fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub logging: LoggingConfig,
    pub ui: UiConfig,
}

/// Where command buttons are published on the host surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub panel_name: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            panel_name: DEFAULT_PANEL_NAME.to_string(),
        }
    }
}
