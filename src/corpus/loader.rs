//! Loading a corpus section into a single search index.

use crate::cache::{self, IndexCache};
use crate::error::LoadError;
use crate::search::{MalformedPolicy, SearchIndex};
use crate::searchdata::parse_search_data;
use std::path::Path;
use std::time::Instant;

use super::layout::Corpus;

/// A section's merged index and how it was obtained.
#[derive(Debug, Clone)]
pub struct LoadedSection {
    pub section: String,
    pub label: String,
    pub index: SearchIndex,
    pub policy: MalformedPolicy,
    /// Records dropped under [`MalformedPolicy::Skip`], prefixed with their shard.
    pub skipped: Vec<String>,
    pub shard_count: usize,
    pub from_cache: bool,
}

/// Reads every shard of a section, builds each one and merges them.
///
/// When a cache is given, a section whose shards are unchanged since the last
/// build is restored from it instead of being parsed again.
pub fn load_section(
    corpus: &Corpus,
    section_name: &str,
    policy: MalformedPolicy,
    cache: Option<&IndexCache>,
) -> Result<LoadedSection, LoadError> {
    let start = Instant::now();
    let section = corpus
        .section(section_name)
        .ok_or_else(|| LoadError::UnknownSection {
            section: section_name.to_string(),
            available: corpus.section_names(),
        })?;

    let contents = section
        .shards
        .iter()
        .map(|path| {
            std::fs::read_to_string(path).map_err(|e| LoadError::Shard {
                path: path.clone(),
                error: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let fingerprint = cache::fingerprint(contents.iter().map(String::as_str), policy);
    let cache_path = cache.map(|cache| cache.path_for(corpus.root(), &section.name));

    if let (Some(cache), Some(path)) = (cache, &cache_path)
        && let Some(cached) = cache.load(path, fingerprint)
    {
        match SearchIndex::build(cached.records) {
            Ok(index) => {
                tracing::debug!(
                    "Loaded cached section '{}' ({} records) in {:?}",
                    section.name,
                    index.len(),
                    start.elapsed()
                );
                return Ok(LoadedSection {
                    section: section.name.clone(),
                    label: section.label.clone(),
                    index,
                    policy,
                    skipped: cached.skipped,
                    shard_count: section.shards.len(),
                    from_cache: true,
                });
            }
            Err(e) => {
                tracing::warn!("Discarding invalid cached section '{}': {}", section.name, e);
            }
        }
    }

    let mut skipped = vec![];
    let mut shards = Vec::with_capacity(contents.len());
    for (path, content) in section.shards.iter().zip(&contents) {
        let records = parse_search_data(content).map_err(|e| LoadError::Shard {
            path: path.clone(),
            error: e.to_string(),
        })?;

        let origin = shard_name(path);
        let outcome = SearchIndex::build_with_policy(records, policy).map_err(|error| {
            LoadError::Malformed {
                section: section.name.clone(),
                origin: origin.clone(),
                error,
            }
        })?;
        skipped.extend(outcome.skipped.iter().map(|e| format!("{}: {}", origin, e)));
        shards.push(outcome.index);
    }

    let merged = SearchIndex::merge(shards, policy).map_err(|error| LoadError::Malformed {
        section: section.name.clone(),
        origin: "merged shards".to_string(),
        error,
    })?;
    skipped.extend(merged.skipped.iter().map(|e| format!("merged shards: {}", e)));

    tracing::info!(
        "Built section '{}': {} records, {} entries from {} shards in {:?}",
        section.name,
        merged.index.len(),
        merged.index.entry_count(),
        section.shards.len(),
        start.elapsed()
    );

    if let (Some(cache), Some(path)) = (cache, &cache_path)
        && let Err(e) = cache.store(path, fingerprint, policy, merged.index.records(), &skipped)
    {
        tracing::warn!("Failed to cache section '{}': {:#}", section.name, e);
    }

    Ok(LoadedSection {
        section: section.name.clone(),
        label: section.label.clone(),
        index: merged.index,
        policy,
        skipped,
        shard_count: section.shards.len(),
        from_cache: false,
    })
}

fn shard_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}
