//! Automatic corpus detection for server startup.
//!
//! Generated documentation usually lives a few levels below the project root
//! and is usually git-ignored, so detection checks the common output locations
//! first and then walks a bounded depth without honouring ignore files.

use ignore::WalkBuilder;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Output locations checked before walking, relative to the start directory.
const COMMON_LOCATIONS: &[&str] = &[
    ".",
    "html",
    "docs/html",
    "doc/html",
    "Docs/html",
    "Docs/Generated/html",
    "build/docs/html",
];

/// Maximum directory depth searched by the fallback walk.
const MAX_WALK_DEPTH: usize = 6;

/// Detects a corpus starting from the current working directory.
///
/// Returns the canonicalized HTML output directory, or None if nothing was found.
pub async fn auto_detect_corpus() -> Option<PathBuf> {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            debug!("Failed to get current working directory: {}", e);
            return None;
        }
    };

    debug!("Starting corpus auto-detection from: {}", cwd.display());

    let found = tokio::task::spawn_blocking(move || find_corpus(&cwd))
        .await
        .ok()
        .flatten()?;

    match tokio::fs::canonicalize(&found).await {
        Ok(canonical) => {
            info!("✓ Auto-detected corpus: {}", canonical.display());
            Some(canonical)
        }
        Err(e) => {
            warn!(
                "Found corpus at {} but canonicalization failed: {}",
                found.display(),
                e
            );
            None
        }
    }
}

/// Finds the HTML output directory closest to `start`.
pub fn find_corpus(start: &Path) -> Option<PathBuf> {
    if let Some(found) = COMMON_LOCATIONS
        .iter()
        .map(|location| start.join(location))
        .find(|candidate| has_search_data(candidate))
    {
        return Some(found);
    }

    let mut candidates: Vec<PathBuf> = WalkBuilder::new(start)
        .max_depth(Some(MAX_WALK_DEPTH))
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_dir()) && e.file_name() == "search")
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .filter(|root| has_search_data(root))
        .collect();

    // Shallowest first, then by path for determinism
    candidates.sort_by_key(|path| (path.components().count(), path.clone()));
    candidates.into_iter().next()
}

/// True if `root/search` holds a section table or at least one shard.
fn has_search_data(root: &Path) -> bool {
    let search = root.join("search");
    if search.join("searchdata.js").is_file() {
        return true;
    }
    std::fs::read_dir(&search)
        .map(|entries| {
            entries.filter_map(Result::ok).any(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.ends_with("_0.js")
            })
        })
        .unwrap_or(false)
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
///
/// Returns `Cow::Borrowed` if no expansion needed, `Cow::Owned` if expanded.
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
