use crate::state::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

/// Parameters for list_sections tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListSectionsRequest {}

/// List the sections of the current corpus and which of them are loaded.
pub async fn handle_list_sections(
    state: &IndexState,
    _request: ListSectionsRequest,
) -> Result<String, String> {
    let corpus = state.corpus().await.ok_or_else(|| {
        "No corpus configured. Use set_corpus with the path of a generated HTML directory."
            .to_string()
    })?;

    let mut output = format!("Sections in {}:\n\n", corpus.root().display());
    for section in corpus.sections() {
        let status = match state.get_cached(&section.name).await {
            Some(loaded) => format!(
                "loaded, {} records, {} entries",
                loaded.index.len(),
                loaded.index.entry_count()
            ),
            None => "not loaded".to_string(),
        };
        let default_marker = if section.name == state.config().section {
            " [default]"
        } else {
            ""
        };
        let _ = writeln!(
            output,
            "• `{}` - {}{} ({} shards, {})",
            section.name,
            section.label,
            default_marker,
            section.shards.len(),
            status
        );
    }

    Ok(output)
}
