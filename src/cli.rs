use crate::search::MalformedPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "doxsearch-mcp")]
#[command(version)]
#[command(about = "Prefix search over Doxygen-generated documentation for AI assistants", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./doxsearch.toml, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// How malformed records are handled: reject or skip
    #[arg(long, global = true)]
    pub on_malformed: Option<MalformedPolicy>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run (default: serve)
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the MCP server over stdio
    Serve {
        /// HTML output directory (overrides config and auto-detection)
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
    /// Search a corpus from the command line
    Search {
        query: String,
        #[arg(long)]
        corpus: Option<PathBuf>,
        #[arg(short, long)]
        section: Option<String>,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Print matching records as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the sections of a corpus
    Sections {
        #[arg(long)]
        corpus: Option<PathBuf>,
    },
    /// Print a section's merged index in the generated data file layout
    Dump {
        #[arg(long)]
        corpus: Option<PathBuf>,
        #[arg(short, long)]
        section: Option<String>,
    },
}

impl Cli {
    /// The requested command, serving when none was given.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve { corpus: None })
    }
}
