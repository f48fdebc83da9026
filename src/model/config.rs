use serde::{Deserialize, Serialize};

use super::view::{Filter, SortKey, ViewPrefs};

/// Configuration from .ticklist/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage key the collection is persisted under (file stem on disk)
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig { key: default_key() }
    }
}

/// Starting view preferences for `list` and `shell`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViewConfig {
    #[serde(default)]
    pub filter: Filter,
    #[serde(default)]
    pub sort: SortKey,
}

impl ViewConfig {
    pub fn prefs(&self) -> ViewPrefs {
        ViewPrefs::new(self.filter, "", self.sort)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Maximum display width for todo text in listings
    #[serde(default = "default_width")]
    pub width: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            width: default_width(),
        }
    }
}

fn default_key() -> String {
    "todos".to_string()
}

fn default_width() -> usize {
    72
}
