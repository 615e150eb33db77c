use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ForkConfig {
    /// Grocery list persistence
    #[serde(default)]
    pub grocery: GroceryConfig,
    /// Stream (history timeline) assembly
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Which backing store holds the grocery list
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process-lifetime only, nothing written to disk
    Memory,
    /// JSON file on local disk
    #[default]
    File,
}

/// Configuration for the grocery list store
#[derive(Debug, Deserialize, Clone)]
pub struct GroceryConfig {
    /// Backend implementation to use
    #[serde(default)]
    pub backend: BackendKind,
    /// Path of the JSON file used by the file backend
    #[serde(default = "default_grocery_path")]
    pub path: PathBuf,
}

impl Default for GroceryConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_grocery_path(),
        }
    }
}

/// Configuration for building the recipe stream from version-control history
#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    /// Commit message prefixes that never show up in the stream
    #[serde(default = "default_noise_prefixes")]
    pub noise_prefixes: Vec<String>,
    /// Maximum number of log entries considered
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            noise_prefixes: default_noise_prefixes(),
            max_events: default_max_events(),
        }
    }
}

// Default value functions
fn default_grocery_path() -> PathBuf {
    PathBuf::from("grocery-list.json")
}

fn default_noise_prefixes() -> Vec<String> {
    vec![
        "Log cook".to_string(),
        "Add favorite".to_string(),
        "Remove favorite".to_string(),
        "Delete cook".to_string(),
    ]
}

fn default_max_events() -> usize {
    50
}

impl ForkConfig {
    /// Load configuration from file and environment variables
    ///
    /// See [`load_config`] for the precedence rules.
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }
}

/// Load configuration from file and environment variables
///
/// Configuration is loaded with the following priority (highest to lowest):
/// 1. Environment variables with RECIPE_FORK__ prefix
/// 2. config.toml file in current directory
/// 3. Default values
///
/// Environment variable format: RECIPE_FORK__GROCERY__PATH
pub fn load_config() -> Result<ForkConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE_FORK__GROCERY__BACKEND
        .add_source(
            Environment::with_prefix("RECIPE_FORK")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
