//! Immutable prefix-search index over normalized search keys.

use crate::error::MalformedDataError;
use crate::types::IndexRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::normalize::{is_normalized, normalize};

/// What to do with structurally invalid records at build time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the whole build on the first invalid record.
    #[default]
    Reject,
    /// Drop invalid records and report them. For duplicated keys the first
    /// occurrence is kept.
    Skip,
}

impl fmt::Display for MalformedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reject => "reject",
            Self::Skip => "skip",
        })
    }
}

impl FromStr for MalformedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown policy '{}' (expected 'reject' or 'skip')",
                other
            )),
        }
    }
}

/// Result of a build: the index plus every record that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub index: SearchIndex,
    pub policy: MalformedPolicy,
    /// Always empty under [`MalformedPolicy::Reject`].
    pub skipped: Vec<MalformedDataError>,
}

/// A load-once table of search keys sorted for prefix search.
///
/// Records are kept sorted by key (ordinal byte order), keys are unique and
/// every record has at least one entry. There is no way to mutate an index
/// after [`SearchIndex::build`], so it can be shared freely across threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchIndex {
    records: Vec<IndexRecord>,
}

impl SearchIndex {
    /// Builds an index, rejecting it if any record is invalid.
    pub fn build(
        records: impl IntoIterator<Item = IndexRecord>,
    ) -> Result<Self, MalformedDataError> {
        Self::build_with_policy(records, MalformedPolicy::Reject).map(|outcome| outcome.index)
    }

    /// Builds an index, handling invalid records according to `policy`.
    pub fn build_with_policy(
        records: impl IntoIterator<Item = IndexRecord>,
        policy: MalformedPolicy,
    ) -> Result<BuildOutcome, MalformedDataError> {
        let mut skipped = vec![];
        let mut keep = |error: MalformedDataError| match policy {
            MalformedPolicy::Reject => Err(error),
            MalformedPolicy::Skip => {
                tracing::warn!("Skipping malformed record: {}", error);
                skipped.push(error);
                Ok(())
            }
        };

        let mut valid: Vec<(usize, IndexRecord)> = vec![];
        for (position, record) in records.into_iter().enumerate() {
            if record.search_key.is_empty() {
                keep(MalformedDataError::EmptyKey { position })?;
            } else if !is_normalized(&record.search_key) {
                keep(MalformedDataError::UnnormalizedKey {
                    position,
                    key: record.search_key,
                })?;
            } else if record.entries.is_empty() {
                keep(MalformedDataError::NoEntries {
                    position,
                    key: record.search_key,
                })?;
            } else {
                valid.push((position, record));
            }
        }

        // Stable, so among equal keys the earliest record comes first
        valid.sort_by(|(_, a), (_, b)| a.search_key.cmp(&b.search_key));

        let mut sorted: Vec<IndexRecord> = Vec::with_capacity(valid.len());
        let mut last_position = 0;
        for (position, record) in valid {
            if let Some(last) = sorted.last()
                && last.search_key == record.search_key
            {
                keep(MalformedDataError::DuplicateKey {
                    key: record.search_key,
                    first: last_position,
                    duplicate: position,
                })?;
                continue;
            }
            last_position = position;
            sorted.push(record);
        }

        // Report skips in input order regardless of where they were detected
        skipped.sort_by_key(MalformedDataError::position);

        Ok(BuildOutcome {
            index: Self { records: sorted },
            policy,
            skipped,
        })
    }

    /// Merges shard indexes into one, re-checking key uniqueness across shards.
    ///
    /// Record positions in reported errors count across all shards in order.
    pub fn merge(
        shards: impl IntoIterator<Item = Self>,
        policy: MalformedPolicy,
    ) -> Result<BuildOutcome, MalformedDataError> {
        Self::build_with_policy(shards.into_iter().flat_map(|shard| shard.records), policy)
    }

    /// Returns every record whose key starts with the normalized query, in key order.
    ///
    /// An empty (or whitespace-only) query matches the whole index.
    pub fn prefix_search(&self, query: &str) -> &[IndexRecord] {
        self.prefix_range(&normalize(query))
    }

    /// Prefix search with an already-normalized key prefix.
    pub fn prefix_range(&self, prefix: &str) -> &[IndexRecord] {
        let start = self
            .records
            .partition_point(|record| record.search_key.as_str() < prefix);
        let len = self.records[start..]
            .partition_point(|record| record.search_key.starts_with(prefix));
        &self.records[start..start + len]
    }

    /// Exact lookup of a normalized key.
    pub fn get(&self, key: &str) -> Option<&IndexRecord> {
        self.records
            .binary_search_by(|record| record.search_key.as_str().cmp(key))
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn records(&self) -> &[IndexRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexRecord> {
        self.records.iter()
    }

    /// Get the number of records in the index
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of entries across all records.
    pub fn entry_count(&self) -> usize {
        self.records.iter().map(|record| record.entries.len()).sum()
    }

    pub fn into_records(self) -> Vec<IndexRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a SearchIndex {
    type Item = &'a IndexRecord;
    type IntoIter = std::slice::Iter<'a, IndexRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entry;
    use assert2::{check, let_assert};
    use rstest::{fixture, rstest};

    fn record(key: &str, label: &str, link: &str, scope: &str) -> IndexRecord {
        IndexRecord::new(key, vec![Entry::new(label, link, scope)])
    }

    fn keys(records: &[IndexRecord]) -> Vec<&str> {
        records.iter().map(|r| r.search_key.as_str()).collect()
    }

    #[fixture]
    fn index() -> SearchIndex {
        SearchIndex::build(vec![
            record("mouseevent", "MouseEvent", "../structsky_1_1_event_1_1_mouse_event.html", "sky::Event"),
            record("matrix4b", "Matrix4b", "../group__mat4aliases.html#ga3a1c98143f406650290733ef30bd9504", "sky"),
            record("matrix4", "Matrix4", "../structsky_1_1_matrix4.html", "sky::Matrix4&lt; T &gt;"),
            record("memoryblock", "MemoryBlock", "../structsky_1_1_memory_block.html", "sky"),
            record("mouse_5fposition", "mouse_position", "../structsky_1_1_event.html#af1345a350ff75cc2d0dddc39245f5ad7", "sky::Event"),
            record("mouse", "mouse", "../structsky_1_1_event.html#a6c6e41929e966d55bed593ee24d2d7e7", "sky::Event"),
        ])
        .unwrap()
    }

    #[rstest]
    fn test_build_sorts_by_key(index: SearchIndex) {
        check!(
            keys(index.records())
                == [
                    "matrix4",
                    "matrix4b",
                    "memoryblock",
                    "mouse",
                    "mouse_5fposition",
                    "mouseevent"
                ]
        );
    }

    #[rstest]
    #[case("matrix4", &["matrix4", "matrix4b"])]
    #[case("matrix4b", &["matrix4b"])]
    #[case("Matrix4", &["matrix4", "matrix4b"])]
    #[case("  MOUSE ", &["mouse", "mouse_5fposition", "mouseevent"])]
    #[case("mouse_", &["mouse_5fposition"])]
    #[case("mouse_p", &["mouse_5fposition"])]
    #[case("me", &["memoryblock"])]
    #[case("matrix4bx", &[])]
    #[case("zzz", &[])]
    #[case("a", &[])]
    fn test_prefix_search(index: SearchIndex, #[case] query: &str, #[case] expected: &[&str]) {
        check!(keys(index.prefix_search(query)) == expected);
    }

    #[rstest]
    fn test_empty_query_returns_everything(index: SearchIndex) {
        check!(index.prefix_search("") == index.records());
        check!(index.prefix_search("   ").len() == 6);
    }

    #[rstest]
    fn test_search_is_deterministic(index: SearchIndex) {
        let first = index.prefix_search("m").to_vec();
        let second = index.prefix_search("m").to_vec();
        check!(first == second);
    }

    #[rstest]
    fn test_exact_lookup(index: SearchIndex) {
        let_assert!(Some(found) = index.get("matrix4b"));
        check!(found.label() == "Matrix4b");
        check!(index.get("matrix").is_none());
    }

    #[test]
    fn test_overloads_keep_insertion_order() {
        let entries = vec![
            Entry::new("Matrix4", "../structsky_1_1_matrix4.html", "sky::Matrix4&lt; T &gt;"),
            Entry::new("Matrix4", "../structsky_1_1_matrix4.html#afd7cd0505a00da5aae8498363d6125dc", "sky::Matrix4::Matrix4()"),
            Entry::new("Matrix4", "../structsky_1_1_matrix4.html#aee398806b6d803144f092e2d0e3aa704", "sky::Matrix4::Matrix4(const T value)"),
        ];
        let index = SearchIndex::build(vec![IndexRecord::new("matrix4", entries.clone())]).unwrap();
        check!(index.prefix_search("matrix4")[0].entries == entries);
        check!(index.entry_count() == 3);
    }

    #[test]
    fn test_rejects_empty_key() {
        let result = SearchIndex::build(vec![
            record("matrix4", "Matrix4", "../a.html", "sky"),
            record("", "Nothing", "../b.html", "sky"),
        ]);
        let_assert!(Err(MalformedDataError::EmptyKey { position: 1 }) = result);
    }

    #[test]
    fn test_rejects_duplicate_key() {
        let result = SearchIndex::build(vec![
            record("matrix4", "Matrix4", "../a.html", "sky"),
            record("minutes", "minutes", "../b.html", "sky::Timespan"),
            record("matrix4", "Matrix4", "../c.html", "sky"),
        ]);
        let_assert!(Err(MalformedDataError::DuplicateKey { key, first, duplicate }) = result);
        check!(key == "matrix4");
        check!(first == 0);
        check!(duplicate == 2);
    }

    #[test]
    fn test_rejects_record_without_entries() {
        let result = SearchIndex::build(vec![IndexRecord::new("metalgdi", vec![])]);
        let_assert!(Err(MalformedDataError::NoEntries { position: 0, .. }) = result);
    }

    #[test]
    fn test_rejects_unnormalized_key() {
        let result = SearchIndex::build(vec![record("Matrix4", "Matrix4", "../a.html", "sky")]);
        let_assert!(Err(MalformedDataError::UnnormalizedKey { position: 0, .. }) = result);
    }

    /// Keys no query can normalize to: escaped letters or digits, uppercase non-ASCII.
    #[rstest]
    #[case("_41bc")]
    #[case("matrix_34")]
    #[case("\u{c9}v\u{e9}nement")]
    fn test_rejects_unreachable_key(#[case] key: &str) {
        let result = SearchIndex::build(vec![record(key, key, "../a.html", "sky")]);
        let_assert!(Err(MalformedDataError::UnnormalizedKey { position: 0, .. }) = result);
    }

    #[test]
    fn test_skip_policy_reports_every_bad_record() {
        let outcome = SearchIndex::build_with_policy(
            vec![
                record("matrix4", "Matrix4", "../a.html", "sky"),
                record("", "Nothing", "../b.html", "sky"),
                record("matrix4", "Matrix4", "../c.html", "sky"),
                IndexRecord::new("metalgdi", vec![]),
                record("minutes", "minutes", "../d.html", "sky::Timespan"),
            ],
            MalformedPolicy::Skip,
        )
        .unwrap();

        check!(keys(outcome.index.records()) == ["matrix4", "minutes"]);
        check!(outcome.index.records()[0].entries[0].target_link == "../a.html");
        let positions: Vec<usize> = outcome.skipped.iter().map(MalformedDataError::position).collect();
        check!(positions == [1, 2, 3]);
    }

    #[test]
    fn test_merge_shards() {
        let first = SearchIndex::build(vec![record("milliseconds", "milliseconds", "../a.html", "sky::Timespan")]).unwrap();
        let second = SearchIndex::build(vec![record("frame", "Frame", "../b.html", "sky")]).unwrap();

        let outcome = SearchIndex::merge([first, second], MalformedPolicy::Reject).unwrap();
        check!(keys(outcome.index.records()) == ["frame", "milliseconds"]);
        check!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_merge_rejects_overlapping_shards() {
        let first = SearchIndex::build(vec![record("frame", "Frame", "../a.html", "sky")]).unwrap();
        let second = SearchIndex::build(vec![record("frame", "Frame", "../b.html", "sky")]).unwrap();

        let result = SearchIndex::merge([first, second], MalformedPolicy::Reject);
        let_assert!(Err(MalformedDataError::DuplicateKey { first: 0, duplicate: 1, .. }) = result);
    }

    #[rstest]
    #[case("reject", MalformedPolicy::Reject)]
    #[case("Skip", MalformedPolicy::Skip)]
    fn test_policy_from_str(#[case] input: &str, #[case] expected: MalformedPolicy) {
        check!(input.parse::<MalformedPolicy>() == Ok(expected));
        check!(input.to_lowercase() == expected.to_string());
    }

    #[test]
    fn test_policy_from_str_rejects_unknown() {
        check!("ignore".parse::<MalformedPolicy>().is_err());
    }
}
