//! Application configuration for contentgraph.
//!
//! User config lives at `~/.contentgraph/contentgraph.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentGraphError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentgraph.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentgraph";

// ---------------------------------------------------------------------------
// Config structs (matching contentgraph.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where loaded content comes from.
    #[serde(default)]
    pub content: ContentConfig,

    /// Built-in enrichment tuning.
    #[serde(default)]
    pub enrichment: EnrichmentSettings,

    /// Navigation grouping.
    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// `[content]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// JSON file of raw items produced by the external loader.
    #[serde(default = "default_items_file")]
    pub items_file: String,

    /// Collection that feeds the documentation navigation.
    #[serde(default = "default_docs_collection")]
    pub docs_collection: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            items_file: default_items_file(),
            docs_collection: default_docs_collection(),
        }
    }
}

fn default_items_file() -> String {
    "content/items.json".into()
}
fn default_docs_collection() -> String {
    "docs".into()
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    /// Reading speed used by the `readTime` step.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
        }
    }
}

fn default_words_per_minute() -> u32 {
    200
}

/// `[navigation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Group key for items whose slug has no `/`.
    #[serde(default = "default_group")]
    pub default_group: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            default_group: default_group(),
        }
    }
}

fn default_group() -> String {
    "default".into()
}

// ---------------------------------------------------------------------------
// Query options (runtime, merged from config)
// ---------------------------------------------------------------------------

/// Runtime settings consumed by the query engine and its built-in enrichers.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Reading speed for `readTime`. Zero is treated as one.
    pub words_per_minute: u32,
    /// Group key for slugs without a `/`.
    pub default_group: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for QueryOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            words_per_minute: config.enrichment.words_per_minute,
            default_group: config.navigation.default_group.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentgraph/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentGraphError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentgraph/contentgraph.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ContentGraphError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ContentGraphError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ContentGraphError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ContentGraphError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ContentGraphError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("items_file"));
        assert!(toml_str.contains("words_per_minute"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.enrichment.words_per_minute, 200);
        assert_eq!(parsed.content.docs_collection, "docs");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
[content]
items_file = "/tmp/site/items.json"

[navigation]
default_group = "general"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.content.items_file, "/tmp/site/items.json");
        assert_eq!(config.content.docs_collection, "docs");
        assert_eq!(config.navigation.default_group, "general");
        assert_eq!(config.enrichment.words_per_minute, 200);
    }

    #[test]
    fn query_options_from_app_config() {
        let mut app = AppConfig::default();
        app.enrichment.words_per_minute = 250;
        let opts = QueryOptions::from(&app);
        assert_eq!(opts.words_per_minute, 250);
        assert_eq!(opts.default_group, "default");
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/contentgraph.toml")).unwrap_err();
        assert!(matches!(err, ContentGraphError::Io { .. }));
    }
}
