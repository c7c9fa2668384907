//! Layout of a generated HTML output directory and its search sections.
//!
//! The `search/` directory holds one file per section and initial character:
//! shard `i` of section `name` is `search/{name}_{i:x}.js`, where `i` is the
//! position of the initial in the section's character list. `searchdata.js`
//! lists those characters along with the section names and labels.

use crate::error::LoadError;
use crate::searchdata::parse::Parser;
use crate::types::Entry;
use ahash::AHashMap;
use ignore::WalkBuilder;
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

const SEARCH_DIR: &str = "search";
const SECTION_TABLE: &str = "searchdata.js";

/// Matches `var name = { ... };` blocks in the section table.
static TABLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+(\w+)\s*=\s*\{(.*?)\}\s*;").expect("valid table regex")
});

/// Matches `id: "text"` pairs inside a block.
static TABLE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\d+)\s*:\s*("(?:[^"\\]|\\.)*")"#).expect("valid entry regex")
});

/// One search section (`all`, `classes`, `functions`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: u32,
    /// File prefix of the shards, e.g. `all`.
    pub name: String,
    /// Human-readable label, e.g. `All`.
    pub label: String,
    /// Existing shard files, in initial order.
    pub shards: Vec<PathBuf>,
}

/// A generated documentation corpus with search data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    root: PathBuf,
    search_dir: PathBuf,
    sections: Vec<Section>,
}

impl Corpus {
    /// Opens a corpus from its HTML output directory or its `search/` directory.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let (root, search_dir) = if path.join(SEARCH_DIR).is_dir() {
            (path.to_path_buf(), path.join(SEARCH_DIR))
        } else if path.file_name().is_some_and(|name| name == SEARCH_DIR) && path.is_dir() {
            let root = path.parent().unwrap_or(path).to_path_buf();
            (root, path.to_path_buf())
        } else {
            return Err(LoadError::CorpusNotFound {
                path: path.to_path_buf(),
            });
        };

        let table_path = search_dir.join(SECTION_TABLE);
        let sections = match std::fs::read_to_string(&table_path) {
            Ok(table) => sections_from_table(&search_dir, &table),
            Err(e) => {
                tracing::debug!(
                    "No section table at {} ({}), discovering shards",
                    table_path.display(),
                    e
                );
                discover_sections(&search_dir)
            }
        };

        if sections.iter().all(|section| section.shards.is_empty()) {
            return Err(LoadError::CorpusNotFound { path: search_dir });
        }

        tracing::info!(
            "Opened corpus at {} ({} sections)",
            root.display(),
            sections.len()
        );

        Ok(Self {
            root,
            search_dir,
            sections,
        })
    }

    /// The HTML output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn search_dir(&self) -> &Path {
        &self.search_dir
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Finds a section by name or label, ignoring case.
    pub fn section(&self, name: &str) -> Option<&Section> {
        let name = name.trim();
        self.sections.iter().find(|section| {
            section.name.eq_ignore_ascii_case(name) || section.label.eq_ignore_ascii_case(name)
        })
    }

    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.name.clone()).collect()
    }

    /// Absolute path of the page an entry links to (links are relative to `search/`).
    pub fn resolve_link(&self, entry: &Entry) -> PathBuf {
        lexical_join(&self.search_dir, entry.page())
    }
}

/// Builds sections from the `searchdata.js` tables.
fn sections_from_table(search_dir: &Path, table: &str) -> Vec<Section> {
    let mut blocks: AHashMap<&str, BTreeMap<u32, String>> = AHashMap::new();
    for block in TABLE_BLOCK.captures_iter(table) {
        let (Some(name), Some(body)) = (block.get(1), block.get(2)) else {
            continue;
        };
        let entries = TABLE_ENTRY
            .captures_iter(body.as_str())
            .filter_map(|entry| {
                let id = entry.get(1)?.as_str().parse().ok()?;
                let text = Parser::new(entry.get(2)?.as_str()).parse_string('"').ok()?;
                Some((id, text))
            })
            .collect();
        blocks.insert(name.as_str(), entries);
    }

    let (Some(initials), Some(names)) = (
        blocks.get("indexSectionsWithContent"),
        blocks.get("indexSectionNames"),
    ) else {
        tracing::warn!("Section table is incomplete, discovering shards instead");
        return discover_sections(search_dir);
    };
    let labels = blocks.get("indexSectionLabels");

    names
        .iter()
        .map(|(&id, name)| {
            let shards = initials
                .get(&id)
                .map(|chars| {
                    (0..chars.chars().count())
                        .map(|idx| search_dir.join(format!("{}_{:x}.js", name, idx)))
                        .filter(|path| {
                            let exists = path.is_file();
                            if !exists {
                                tracing::warn!("Missing shard {}", path.display());
                            }
                            exists
                        })
                        .collect()
                })
                .unwrap_or_default();

            Section {
                id,
                name: name.clone(),
                label: labels
                    .and_then(|labels| labels.get(&id))
                    .cloned()
                    .unwrap_or_else(|| capitalize(name)),
                shards,
            }
        })
        .collect()
}

/// Groups `{name}_{hex}.js` files into sections when no table is available.
fn discover_sections(search_dir: &Path) -> Vec<Section> {
    let mut grouped: BTreeMap<String, Vec<(u32, PathBuf)>> = BTreeMap::new();

    let files = WalkBuilder::new(search_dir)
        .max_depth(Some(1))
        .git_ignore(false)
        .git_exclude(false)
        .git_global(false)
        .build()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_some_and(|t| t.is_file()));

    for file in files {
        let path = file.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("js") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let Some((name, shard)) = stem.rsplit_once('_') else {
            continue;
        };
        let Ok(shard) = u32::from_str_radix(shard, 16) else {
            continue;
        };
        grouped
            .entry(name.to_string())
            .or_default()
            .push((shard, path.to_path_buf()));
    }

    // "all" first, the rest alphabetically
    let mut names: Vec<String> = grouped.keys().cloned().collect();
    names.sort_by_key(|name| (name != "all", name.clone()));

    names
        .into_iter()
        .zip(0..)
        .map(|(name, id)| {
            let mut shards = grouped.remove(&name).unwrap_or_default();
            shards.sort();
            Section {
                id,
                label: capitalize(&name),
                name,
                shards: shards.into_iter().map(|(_, path)| path).collect(),
            }
        })
        .collect()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Joins a relative link onto a base directory, resolving `..` lexically.
fn lexical_join(base: &Path, relative: &str) -> PathBuf {
    let mut joined = base.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::ParentDir => {
                joined.pop();
            }
            Component::CurDir => {}
            other => joined.push(other),
        }
    }
    joined
}
