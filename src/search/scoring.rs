//! Similarity ranking for queries that match nothing.

use crate::types::IndexRecord;
use rapidfuzz::distance::jaro_winkler;

use super::index::SearchIndex;
use super::normalize::normalize;

/// Minimum Jaro-Winkler similarity for a key to be offered as a suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A record that resembles the query, with its similarity score.
#[derive(Debug, Clone, Copy)]
pub struct Suggestion<'a> {
    pub record: &'a IndexRecord,
    pub score: f64,
}

/// Ranks keys by similarity to the normalized query, best first.
///
/// Ties are broken by key order so results are deterministic.
pub fn suggest<'a>(index: &'a SearchIndex, query: &str, limit: usize) -> Vec<Suggestion<'a>> {
    let query = normalize(query);
    if query.is_empty() {
        return vec![];
    }

    let mut suggestions: Vec<_> = index
        .iter()
        .map(|record| Suggestion {
            record,
            score: jaro_winkler::similarity(query.chars(), record.search_key.chars()),
        })
        .filter(|suggestion| suggestion.score >= SUGGESTION_THRESHOLD)
        .collect();

    suggestions.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.record.search_key.cmp(&b.record.search_key))
    });
    suggestions.truncate(limit);
    suggestions
}
