use crate::corpus::{Corpus, expand_tilde};
use crate::state::IndexState;
use anyhow::{Result, anyhow};
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

/// Parameters for set_corpus tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetCorpusRequest {
    /// Path to the generated HTML directory (or its `search/` subdirectory)
    pub path: String,
}

/// Open a corpus and make it the current one.
///
/// Returns the opened corpus and whether it differs from the previous one.
pub async fn handle_set_corpus(state: &IndexState, path: &str) -> Result<(Arc<Corpus>, bool)> {
    let expanded = expand_tilde(path);
    let path_buf = PathBuf::from(expanded.as_ref());

    let canonical_path = tokio::fs::canonicalize(&path_buf)
        .await
        .map_err(|e| anyhow!("Failed to resolve path '{}': {}", path, e))?;

    if !canonical_path.is_dir() {
        return Err(anyhow!(
            "Path is not a directory: {}",
            canonical_path.display()
        ));
    }

    let corpus = tokio::task::spawn_blocking(move || Corpus::open(&canonical_path))
        .await
        .map_err(|e| anyhow!("Corpus scan task failed: {}", e))??;

    let changed = state.set_corpus(corpus).await;
    let corpus = state
        .corpus()
        .await
        .ok_or_else(|| anyhow!("Corpus was not stored"))?;

    Ok((corpus, changed))
}

/// Format a user-friendly response showing the configured corpus.
pub fn format_response(corpus: &Corpus, changed: bool) -> String {
    let mut response = if changed {
        format!("Corpus configured: {}\n\n", corpus.root().display())
    } else {
        format!("Corpus unchanged: {}\n\n", corpus.root().display())
    };

    let _ = writeln!(response, "Sections ({}):", corpus.sections().len());
    for section in corpus.sections() {
        let _ = writeln!(
            response,
            "  - {} ({}, {} shards)",
            section.name,
            section.label,
            section.shards.len()
        );
    }

    response
}
