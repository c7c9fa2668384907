pub mod list_sections;
pub mod search;
pub mod set_corpus;

pub use list_sections::*;
pub use search::*;
pub use set_corpus::*;
