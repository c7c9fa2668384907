//! Configuration loaded from TOML files and environment overrides.

use crate::cache::IndexCache;
use crate::error::Result;
use crate::search::MalformedPolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "doxsearch.toml";

/// Application directory name under the user config and cache directories.
const APP_DIR: &str = "doxsearch-mcp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTML output directory to search (auto-detected when unset).
    pub corpus: Option<PathBuf>,
    /// Section searched when a request names none.
    pub section: String,
    /// Default maximum number of records shown per query.
    pub limit: usize,
    /// Handling of malformed records when building an index.
    pub on_malformed: MalformedPolicy,
    /// Where built indexes are cached (defaults to the user cache directory).
    pub cache_dir: Option<PathBuf>,
    /// Whether built indexes are cached on disk at all.
    pub persist_index: bool,
    /// Number of loaded sections kept in memory.
    pub lru_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: None,
            section: "all".to_string(),
            limit: 10,
            on_malformed: MalformedPolicy::Reject,
            cache_dir: None,
            persist_index: true,
            lru_capacity: 16,
        }
    }
}

impl Config {
    /// Loads configuration, then applies environment overrides.
    ///
    /// An explicit path must exist and parse. Otherwise `./doxsearch.toml` and
    /// `<config dir>/doxsearch-mcp/config.toml` are tried in order, falling back
    /// to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => Self::candidate_paths()
                .into_iter()
                .find(|path| path.is_file())
                .map(|path| Self::from_file(&path))
                .transpose()?
                .unwrap_or_default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        if config.lru_capacity == 0 {
            anyhow::bail!("lru_capacity must be at least 1");
        }
        Ok(config)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(APP_DIR).join("config.toml"));
        }
        paths
    }

    /// Applies `DOXSEARCH_CORPUS` and `DOXSEARCH_CACHE_DIR` overrides.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(corpus) = var("DOXSEARCH_CORPUS").filter(|v| !v.is_empty()) {
            self.corpus = Some(PathBuf::from(corpus));
        }
        if let Some(cache_dir) = var("DOXSEARCH_CACHE_DIR").filter(|v| !v.is_empty()) {
            self.cache_dir = Some(PathBuf::from(cache_dir));
        }
    }

    /// The on-disk index cache, if persistence is enabled and a directory is known.
    pub fn index_cache(&self) -> Option<IndexCache> {
        if !self.persist_index {
            return None;
        }
        self.cache_dir
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_DIR)))
            .map(IndexCache::new)
    }
}
