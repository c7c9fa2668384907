//! Codec for the generated `search/*.js` data files.

pub(crate) mod html;
pub(crate) mod parse;
pub(crate) mod render;

pub use html::unescape_html;
pub use parse::parse_search_data;
pub use render::{render_search_data, write_search_data};
