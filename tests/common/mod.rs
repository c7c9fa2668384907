//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Every test gets its own copy of the fixture corpus in a temporary
//! directory, its own `IndexState` with an empty in-memory LRU, and its own
//! on-disk index cache directory (cold cache state).
//!
//! # Fixture Corpus
//!
//! `tests/fixtures/html/search/` holds two sections:
//! - `all`: shard 0 covers `g`, shard 1 is a generated `m` shard
//! - `classes`: a single `m` shard

use doxsearch_mcp::config::Config;
use doxsearch_mcp::state::IndexState;
use doxsearch_mcp::tools::handle_set_corpus;
use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// The checked-in fixture HTML directory.
#[allow(dead_code)] // Used across different integration test crates
pub fn fixture_html() -> PathBuf {
    project_root().join("tests/fixtures/html")
}

/// A temporary directory for test isolation.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content within this workspace.
    ///
    /// Parent directories are created automatically if they don't exist.
    pub fn create_file(&self, path: &str, content: &str) {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
    }

    /// Copies every file of a flat directory into this workspace.
    pub fn copy_dir(&self, source: &Path, dest_relative: &str) {
        let dest = self.root.join(dest_relative);
        std::fs::create_dir_all(&dest)
            .unwrap_or_else(|e| panic!("Failed to create '{}': {}", dest_relative, e));
        let entries = std::fs::read_dir(source)
            .unwrap_or_else(|e| panic!("Failed to read '{}': {}", source.display(), e));
        for entry in entries {
            let entry = entry.expect("Failed to read directory entry");
            if entry.path().is_file() {
                std::fs::copy(entry.path(), dest.join(entry.file_name())).unwrap_or_else(|e| {
                    panic!("Failed to copy '{}': {}", entry.path().display(), e)
                });
            }
        }
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// An isolated corpus with its own state and index cache.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct IsolatedCorpus {
    pub workspace: TempWorkspace,
    pub state: Arc<IndexState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl IsolatedCorpus {
    /// Copies the fixture corpus and opens it with default settings.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Copies the fixture corpus and opens it with `config`.
    ///
    /// The cache directory is always redirected into the workspace.
    pub async fn with_config(config: Config) -> Self {
        let workspace = TempWorkspace::new();
        workspace.copy_dir(&fixture_html().join("search"), "html/search");
        Self::open(workspace, config).await
    }

    /// Opens the `html` directory of an already populated workspace.
    pub async fn open(workspace: TempWorkspace, config: Config) -> Self {
        let config = Config {
            cache_dir: Some(workspace.path().join("cache")),
            ..config
        };
        let state = Arc::new(IndexState::new(config));
        let html = workspace.path().join("html");
        handle_set_corpus(&state, &html.display().to_string())
            .await
            .expect("Failed to open fixture corpus");
        Self { workspace, state }
    }

    pub fn html_dir(&self) -> PathBuf {
        self.workspace.path().join("html")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.workspace.path().join("cache")
    }
}

/// Fixture providing an isolated copy of the fixture corpus.
#[fixture]
pub async fn isolated_corpus() -> IsolatedCorpus {
    IsolatedCorpus::new().await
}
