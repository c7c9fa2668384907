//! Shared index state for tool handlers.
//!
//! Loaded sections are immutable, so they are handed out as `Arc`s and queried
//! without any locking. The locks here only guard the bookkeeping: the LRU of
//! loaded sections and the loads currently in flight, which concurrent callers
//! await together instead of parsing the same shards twice.

use crate::config::Config;
use crate::corpus::{Corpus, LoadedSection, load_section};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Type alias for shared section loading futures.
type SharedLoadFuture = Shared<BoxFuture<'static, Result<Arc<LoadedSection>, String>>>;

/// Sections are keyed by corpus root as well, so a load that finishes after
/// the corpus changed can never be served for the new one.
type SectionKey = (PathBuf, String);

pub struct IndexState {
    /// LRU cache of loaded sections
    cache: RwLock<LruCache<SectionKey, Arc<LoadedSection>>>,

    /// In-flight loads (can be awaited by multiple callers)
    in_flight: Mutex<HashMap<SectionKey, SharedLoadFuture>>,

    /// Current corpus (if detected/configured)
    corpus: RwLock<Option<Arc<Corpus>>>,

    config: Config,
}

impl std::fmt::Debug for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexState")
            .field("cache_size", &self.cache.try_read().map(|c| c.len()).ok())
            .field("in_flight_count", &self.in_flight.try_lock().map(|m| m.len()).ok())
            .field(
                "has_corpus",
                &self.corpus.try_read().map(|c| c.is_some()).ok(),
            )
            .finish_non_exhaustive()
    }
}

impl IndexState {
    pub fn new(config: Config) -> Self {
        let capacity = NonZeroUsize::new(config.lru_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            corpus: RwLock::new(None),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the current corpus.
    pub async fn corpus(&self) -> Option<Arc<Corpus>> {
        self.corpus.read().await.clone()
    }

    /// Replace the current corpus. Returns true if its root changed.
    ///
    /// A changed root drops every cached section.
    pub async fn set_corpus(&self, corpus: Corpus) -> bool {
        let changed = self
            .corpus
            .read()
            .await
            .as_ref()
            .is_none_or(|current| current.root() != corpus.root());

        if changed {
            self.clear_cache().await;
        }
        *self.corpus.write().await = Some(Arc::new(corpus));
        changed
    }

    /// Clear loaded sections.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
        self.in_flight.lock().await.clear();
    }

    /// Resolves the section a request refers to, falling back to the configured default.
    pub fn section_or_default<'a>(&'a self, section: Option<&'a str>) -> &'a str {
        section
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.config.section.as_str())
    }

    /// Get a loaded section, waiting for an in-flight load if needed.
    ///
    /// This is the main entry point for tool handlers. It:
    /// 1. Checks the LRU cache
    /// 2. Joins an in-flight load, or starts one, under a single lock
    /// 3. Awaits the shared load outside the lock
    pub async fn get_index(&self, section: &str) -> Result<Arc<LoadedSection>, String> {
        let corpus = self.corpus().await.ok_or_else(|| {
            "No corpus configured. Use set_corpus with the path of a generated HTML directory."
                .to_string()
        })?;
        let key = section_key(&corpus, section);

        // 1. Check cache first
        if let Some(loaded) = self.cache.write().await.get(&key) {
            tracing::debug!("Cache hit for section {}", section);
            return Ok(loaded.clone());
        }

        // 2. Join or start a load
        let (future, started) = {
            let mut in_flight = self.in_flight.lock().await;

            // The load may have completed between the cache check and taking the lock
            if let Some(loaded) = self.cache.write().await.get(&key) {
                return Ok(loaded.clone());
            }

            match in_flight.get(&key) {
                Some(future) => {
                    tracing::debug!("Awaiting in-flight load for section {}", section);
                    (future.clone(), false)
                }
                None => {
                    tracing::info!("Loading section {}", key.1);
                    let future = self.load_future(corpus, &key);
                    in_flight.insert(key.clone(), future.clone());
                    (future, true)
                }
            }
        };

        // 3. Await outside the lock
        let result = future.await;

        if started {
            // Publish to the cache before retiring the in-flight entry
            if let Ok(ref loaded) = result {
                self.cache.write().await.put(key.clone(), loaded.clone());
            }
            self.in_flight.lock().await.remove(&key);
        }

        result
    }

    fn load_future(&self, corpus: Arc<Corpus>, key: &SectionKey) -> SharedLoadFuture {
        let section = key.1.clone();
        let policy = self.config.on_malformed;
        let cache = self.config.index_cache();

        let load_future: BoxFuture<'static, Result<Arc<LoadedSection>, String>> =
            Box::pin(async move {
                tokio::task::spawn_blocking(move || {
                    load_section(&corpus, &section, policy, cache.as_ref())
                })
                .await
                .map_err(|e| format!("Section loading task failed: {}", e))?
                .map(Arc::new)
                .map_err(|e| e.to_string())
            });

        // Make it shared so multiple callers can await
        load_future.shared()
    }

    /// Check if a section is loaded for the current corpus.
    pub async fn is_cached(&self, section: &str) -> bool {
        let Some(corpus) = self.corpus().await else {
            return false;
        };
        let key = section_key(&corpus, section);
        self.cache.read().await.contains(&key)
    }

    /// Get a loaded section without triggering a load.
    pub async fn get_cached(&self, section: &str) -> Option<Arc<LoadedSection>> {
        let corpus = self.corpus().await?;
        let key = section_key(&corpus, section);
        self.cache.read().await.peek(&key).cloned()
    }
}

/// Keys a section by its canonical name, so a label and a name share one entry.
fn section_key(corpus: &Corpus, section: &str) -> SectionKey {
    let name = corpus
        .section(section)
        .map_or_else(|| section.trim().to_lowercase(), |s| s.name.clone());
    (corpus.root().to_path_buf(), name)
}
