//! Generated documentation corpora: layout, detection and section loading.

pub mod detection;
pub mod layout;
pub mod loader;

pub use detection::{auto_detect_corpus, expand_tilde, find_corpus};
pub use layout::{Corpus, Section};
pub use loader::{LoadedSection, load_section};
