//! Prefix search handler for finding documented symbols.

use crate::corpus::{Corpus, LoadedSection};
use crate::search::{decode_key, suggest};
use crate::state::IndexState;
use crate::types::IndexRecord;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// Number of suggestions offered when a query matches nothing.
const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Symbol name or prefix, e.g. `Matrix4` or `mouse_`
    pub query: String,
    /// Section to search (default: all)
    #[serde(default)]
    pub section: Option<String>,
    /// Maximum number of symbols to return (default: 10)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Loaded section plus the records matching a query.
pub struct SearchOutcome {
    pub corpus: Arc<Corpus>,
    pub loaded: Arc<LoadedSection>,
    pub query: String,
}

impl SearchOutcome {
    /// All matching records, in key order.
    pub fn matches(&self) -> &[IndexRecord] {
        self.loaded.index.prefix_search(&self.query)
    }
}

/// Run a prefix search against the requested section.
pub async fn run_search(state: &IndexState, request: &SearchRequest) -> Result<SearchOutcome, String> {
    let corpus = state.corpus().await.ok_or_else(|| {
        "No corpus configured. Use set_corpus with the path of a generated HTML directory."
            .to_string()
    })?;
    let section = state.section_or_default(request.section.as_deref());
    let loaded = state.get_index(section).await?;

    Ok(SearchOutcome {
        corpus,
        loaded,
        query: request.query.clone(),
    })
}

/// Execute the search operation and format the results.
pub async fn handle_search(state: &IndexState, request: SearchRequest) -> Result<String, String> {
    let outcome = run_search(state, &request).await?;
    let limit = request.limit.unwrap_or(state.config().limit).max(1);
    Ok(format_search_results(&outcome, limit))
}

/// Format search results into a readable string output.
pub fn format_search_results(outcome: &SearchOutcome, limit: usize) -> String {
    let loaded = &outcome.loaded;
    let matches = outcome.matches();

    if matches.is_empty() {
        let mut msg = format!(
            "No results found for '{}' in section '{}'.\n",
            outcome.query, loaded.section
        );

        let suggestions = suggest(&loaded.index, &outcome.query, MAX_SUGGESTIONS);
        if !suggestions.is_empty() {
            msg.push_str("\nDid you mean one of these?\n\n");
            for suggestion in suggestions {
                let _ = writeln!(
                    msg,
                    "• `{}` ({})",
                    suggestion.record.entries[0].display_label(),
                    decode_key(&suggestion.record.search_key)
                );
            }
        }

        msg.push_str("\nSearch tips:\n");
        msg.push_str("• Search matches the start of symbol names, case-insensitively\n");
        msg.push_str("• Try a shorter prefix, e.g. 'Matrix' instead of 'Matrix4x4'\n");
        if outcome.query.contains("::") {
            msg.push_str("• Note: search by symbol name only, not qualified scopes\n");
        }
        return msg;
    }

    let mut output = format!(
        "Search results for '{}' in '{}' ({} {}):\n\n",
        outcome.query,
        loaded.section,
        matches.len(),
        if matches.len() == 1 { "match" } else { "matches" }
    );

    for (idx, record) in matches.iter().take(limit).enumerate() {
        let label = record.entries[0].display_label();
        let key = decode_key(&record.search_key);
        if key == label.to_lowercase() {
            let _ = writeln!(output, "{}. `{}`", idx + 1, label);
        } else {
            let _ = writeln!(output, "{}. `{}` (key: {})", idx + 1, label, key);
        }

        for entry in &record.entries {
            let scope = entry.display_scope();
            let scope = if scope.is_empty() { "(global)".into() } else { scope };
            let mut target = outcome.corpus.resolve_link(entry).display().to_string();
            if let Some(anchor) = entry.anchor() {
                let _ = write!(target, "#{}", anchor);
            }
            let _ = writeln!(output, "   - {} → {}", scope, target);
        }
        output.push('\n');
    }

    if matches.len() > limit {
        let _ = writeln!(
            output,
            "... and {} more. Refine the query or raise the limit.",
            matches.len() - limit
        );
    }

    if !loaded.skipped.is_empty() {
        let _ = writeln!(
            output,
            "Note: {} malformed records were skipped while loading this section.",
            loaded.skipped.len()
        );
    }

    output
}
