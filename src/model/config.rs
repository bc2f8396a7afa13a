use serde::{Deserialize, Serialize};

use super::task::Priority;

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key under which the whole application state is stored
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            key: default_storage_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Categories seeded into a fresh state
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Priority given to tasks added without one
    #[serde(default)]
    pub priority: Priority,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            categories: default_categories(),
            priority: Priority::default(),
        }
    }
}

pub const DEFAULT_STORAGE_KEY: &str = "todo-app-storage";

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

pub fn default_categories() -> Vec<String> {
    [
        "Development",
        "Design",
        "Marketing",
        "Research",
        "Business",
        "Operations",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
