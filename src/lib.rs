pub mod cache;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod search;
pub mod searchdata;
pub mod server;
pub mod state;
pub mod tools;
pub mod tracing;
pub mod types;

pub use error::{LoadError, MalformedDataError, ParseError, Result};
pub use search::{MalformedPolicy, SearchIndex, normalize};
pub use types::{Entry, IndexRecord};
