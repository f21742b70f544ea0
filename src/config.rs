//! Configuration module for the embedding searcher.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `ES_` and use double underscores
//! to separate nested levels:
//! - `ES_SEARCH__MAX_RESULTS=3` sets `search.max_results`
//! - `ES_EMBEDDING__L2_NORMALIZE=true` sets `embedding.l2_normalize`
//! - `ES_INDEX_PATH=/data/index.ldb` sets `index_path`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::searcher::{
    BaseOptions, DEFAULT_MAX_RESULTS, EmbeddingOptions, ExternalFile, SearchOptions,
    SearcherOptions,
};

/// Directory holding the settings file, relative to the workspace root.
pub const CONFIG_DIR: &str = ".embedsearch";

/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "ES_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Embedding model file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    /// Pre-built index file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,

    /// Workspace root directory (where .embedsearch is located)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Query embedding post-processing
    #[serde(default)]
    pub embedding: EmbeddingOptions,

    /// Ranking settings
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Number of neighbors returned per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Only return records with these metadata strings
    #[serde(default)]
    pub metadata_allowlist: Vec<String>,

    /// Never return records with these metadata strings
    #[serde(default)]
    pub metadata_denylist: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            model_path: None,
            index_path: None,
            workspace_root: None,
            embedding: EmbeddingOptions::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            metadata_allowlist: Vec::new(),
            metadata_denylist: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .embedsearch directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels, single
            // underscores stay part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str()
                    .to_lowercase()
                    .replace("__", ".")
                    .into()
            }))
    }

    /// Find the workspace config by looking for .embedsearch directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where .embedsearch is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file with helpful comments
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    /// Like [`init_config_file`](Self::init_config_file), rooted at `root`.
    pub fn init_config_file_in(
        root: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, Self::template())?;

        Ok(config_path)
    }

    fn template() -> String {
        format!(
            r#"# embedsearch configuration file

# Version of the configuration schema
version = 1

# Embedding model file handed to the embedding provider
# model_path = "models/embedder.tflite"

# Pre-built index file
# index_path = "data/searcher_index.ldb"

[embedding]
# Scale query embeddings to unit length before searching
l2_normalize = false
# Quantized embeddings cannot be searched; must stay false
quantize = false

[search]
# Number of nearest neighbors returned per query (must be > 0)
max_results = {DEFAULT_MAX_RESULTS}
# Only return records whose metadata is listed here
metadata_allowlist = []
# Never return records whose metadata is listed here
# (mutually exclusive with metadata_allowlist)
metadata_denylist = []

[logging]
# Default log filter when RUST_LOG is not set
level = "warn"
"#
        )
    }

    /// Searcher options for the configured model and index.
    ///
    /// Unset paths map to empty files so that validation reports them.
    pub fn to_searcher_options(&self) -> SearcherOptions {
        let file = |path: &Option<PathBuf>| {
            path.as_ref()
                .map(ExternalFile::from_path)
                .unwrap_or_default()
        };

        SearcherOptions {
            base_options: BaseOptions {
                model_file: file(&self.model_path),
            },
            embedding_options: self.embedding,
            search_options: SearchOptions {
                index_file: file(&self.index_path),
                max_results: self.search.max_results,
                metadata_allowlist: self.search.metadata_allowlist.clone(),
                metadata_denylist: self.search.metadata_denylist.clone(),
            },
        }
    }
}
