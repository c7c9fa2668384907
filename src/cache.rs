//! On-disk cache of validated section records with fingerprint-based invalidation.
//!
//! A cached section is keyed by the corpus location and section name. Its
//! fingerprint covers the bytes of every shard plus the malformed-record
//! policy, so any regeneration of the search data (or a policy change)
//! invalidates it.

use crate::error::Result;
use crate::search::MalformedPolicy;
use crate::types::IndexRecord;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::{Xxh3, xxh3_64};

/// Bumped whenever the cached layout changes.
const FORMAT_VERSION: u32 = 1;

/// Records of one section as they were last built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSection {
    pub version: u32,
    pub fingerprint: u64,
    pub policy: MalformedPolicy,
    pub records: Vec<IndexRecord>,
    /// Descriptions of records dropped under [`MalformedPolicy::Skip`].
    pub skipped: Vec<String>,
}

/// Computes the fingerprint of a section's shards, in shard order.
pub fn fingerprint<'a>(
    shards: impl IntoIterator<Item = &'a str>,
    policy: MalformedPolicy,
) -> u64 {
    let mut hasher = Xxh3::new();
    hasher.update(policy.to_string().as_bytes());
    for shard in shards {
        // Length prefix keeps shard boundaries significant
        hasher.update(&(shard.len() as u64).to_le_bytes());
        hasher.update(shard.as_bytes());
    }
    hasher.digest()
}

/// Directory holding cached sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for a section of the corpus rooted at `corpus_root`.
    pub fn path_for(&self, corpus_root: &Path, section: &str) -> PathBuf {
        let root_hash = xxh3_64(corpus_root.to_string_lossy().as_bytes());
        self.dir.join(format!("{:016x}-{}.idx", root_hash, section))
    }

    /// Loads a cached section if it matches the fingerprint.
    ///
    /// Stale or unreadable files are deleted so the next store starts clean.
    pub fn load(&self, path: &Path, fingerprint: u64) -> Option<CachedSection> {
        let bytes = std::fs::read(path).ok()?;

        match postcard::from_bytes::<CachedSection>(&bytes) {
            Ok(cached) if cached.version == FORMAT_VERSION && cached.fingerprint == fingerprint => {
                tracing::debug!("Using cached index at {}", path.display());
                Some(cached)
            }
            Ok(_) => {
                tracing::info!(
                    "Cache stale or invalid, will rebuild index (file: {})",
                    path.display()
                );
                let _ = std::fs::remove_file(path);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to deserialize cached index at {}: {}", path.display(), e);
                let _ = std::fs::remove_file(path);
                None
            }
        }
    }

    /// Stores a section, replacing any previous file atomically.
    pub fn store(
        &self,
        path: &Path,
        fingerprint: u64,
        policy: MalformedPolicy,
        records: &[IndexRecord],
        skipped: &[String],
    ) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory {}", self.dir.display()))?;

        let cached = CachedSection {
            version: FORMAT_VERSION,
            fingerprint,
            policy,
            records: records.to_vec(),
            skipped: skipped.to_vec(),
        };
        let bytes = postcard::to_stdvec(&cached).context("Failed to serialize index")?;

        let tmp = path.with_extension("idx.tmp");
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("Failed to write index to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move index into place at {}", path.display()))?;

        tracing::debug!("Cached search index to {}", path.display());
        Ok(())
    }
}
