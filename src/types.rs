//! Records and entries stored in a search index.

use crate::searchdata::unescape_html;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One documented location a search key resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    /// Text shown to the user, HTML-escaped as generated.
    pub label: String,
    /// Link to the page, relative to the `search/` directory, with an optional `#anchor`.
    pub target_link: String,
    /// Enclosing scope (namespace, class, or empty for the global scope), HTML-escaped.
    pub scope_label: String,
    /// Whether the result opens in the parent frame (the generated flag).
    pub target_parent: bool,
}

impl Entry {
    pub fn new(
        label: impl Into<String>,
        target_link: impl Into<String>,
        scope_label: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            target_link: target_link.into(),
            scope_label: scope_label.into(),
            target_parent: true,
        }
    }

    /// The page part of the link, without the anchor.
    pub fn page(&self) -> &str {
        self.target_link
            .split_once('#')
            .map_or(self.target_link.as_str(), |(page, _)| page)
    }

    /// The anchor id, if the link points inside a page.
    pub fn anchor(&self) -> Option<&str> {
        self.target_link
            .split_once('#')
            .map(|(_, anchor)| anchor)
            .filter(|anchor| !anchor.is_empty())
    }

    pub fn display_label(&self) -> Cow<'_, str> {
        unescape_html(&self.label)
    }

    pub fn display_scope(&self) -> Cow<'_, str> {
        unescape_html(&self.scope_label)
    }
}

/// A normalized search key and the entries it resolves to, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexRecord {
    pub search_key: String,
    pub entries: Vec<Entry>,
}

impl IndexRecord {
    pub fn new(search_key: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            search_key: search_key.into(),
            entries,
        }
    }

    /// Label of the record (shared by its entries). Empty when the record has no entries.
    pub fn label(&self) -> &str {
        self.entries.first().map_or("", |entry| entry.label.as_str())
    }
}
