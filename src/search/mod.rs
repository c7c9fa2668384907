//! Prefix search over generated documentation symbols.
//!
//! This module provides key normalization, the immutable [`SearchIndex`]
//! and similarity suggestions for queries without matches.

// Module declarations
pub(crate) mod index;
pub(crate) mod normalize;
pub(crate) mod scoring;

// Public re-exports (used via lib.rs)
pub use index::{BuildOutcome, MalformedPolicy, SearchIndex};
pub use normalize::{decode_key, is_normalized, normalize};
pub use scoring::{SUGGESTION_THRESHOLD, Suggestion, suggest};
