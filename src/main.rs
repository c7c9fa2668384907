use anyhow::{Context, anyhow};
use clap::Parser;
use doxsearch_mcp::cli::{Cli, Command};
use doxsearch_mcp::config::Config;
use doxsearch_mcp::corpus::auto_detect_corpus;
use doxsearch_mcp::searchdata::render_search_data;
use doxsearch_mcp::server::SearchServer;
use doxsearch_mcp::state::IndexState;
use doxsearch_mcp::tools::{
    ListSectionsRequest, SearchRequest, format_search_results, handle_list_sections,
    handle_set_corpus, run_search,
};
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    doxsearch_mcp::tracing::init(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(policy) = cli.on_malformed {
        config.on_malformed = policy;
    }

    match cli.into_command() {
        Command::Serve { corpus } => serve(config, corpus).await,
        Command::Search {
            query,
            corpus,
            section,
            limit,
            json,
        } => {
            let state = open_state(config, corpus).await?;
            let request = SearchRequest {
                query,
                section,
                limit,
            };
            let outcome = run_search(&state, &request).await.map_err(|e| anyhow!(e))?;
            let limit = request.limit.unwrap_or(state.config().limit).max(1);

            if json {
                let matches = outcome.matches();
                let shown = &matches[..matches.len().min(limit)];
                println!("{}", serde_json::to_string_pretty(shown)?);
            } else {
                print!("{}", format_search_results(&outcome, limit));
            }
            Ok(())
        }
        Command::Sections { corpus } => {
            let state = open_state(config, corpus).await?;
            let output = handle_list_sections(&state, ListSectionsRequest::default())
                .await
                .map_err(|e| anyhow!(e))?;
            print!("{}", output);
            Ok(())
        }
        Command::Dump { corpus, section } => {
            let state = open_state(config, corpus).await?;
            let section = state.section_or_default(section.as_deref()).to_string();
            let loaded = state.get_index(&section).await.map_err(|e| anyhow!(e))?;
            for skipped in &loaded.skipped {
                tracing::warn!("Skipped {}", skipped);
            }
            print!("{}", render_search_data(loaded.index.records()));
            Ok(())
        }
    }
}

async fn serve(config: Config, corpus: Option<PathBuf>) -> anyhow::Result<()> {
    tracing::info!("Starting doxsearch-mcp MCP server");

    let state = Arc::new(IndexState::new(config));
    match resolve_corpus(state.config(), corpus).await {
        Some(path) => {
            if let Err(e) = handle_set_corpus(&state, &path.display().to_string()).await {
                tracing::warn!("Failed to open corpus {}: {:#}", path.display(), e);
            }
        }
        None => tracing::info!("No corpus detected; waiting for set_corpus"),
    }

    // Create and serve the MCP server over stdio
    let server = SearchServer::with_state(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    // Wait for the service to complete
    service.waiting().await?;

    Ok(())
}

/// Builds state for a one-shot command, failing if no corpus can be opened.
async fn open_state(config: Config, corpus: Option<PathBuf>) -> anyhow::Result<IndexState> {
    let state = IndexState::new(config);
    let path = resolve_corpus(state.config(), corpus)
        .await
        .context("No corpus found. Pass --corpus or set `corpus` in the configuration.")?;
    handle_set_corpus(&state, &path.display().to_string()).await?;
    Ok(state)
}

/// Corpus precedence: command line, configuration (including environment), detection.
async fn resolve_corpus(config: &Config, explicit: Option<PathBuf>) -> Option<PathBuf> {
    match explicit.or_else(|| config.corpus.clone()) {
        Some(path) => Some(path),
        None => auto_detect_corpus().await,
    }
}
