//! MCP server implementation.

use crate::config::Config;
use crate::state::IndexState;
use crate::tools::list_sections::{ListSectionsRequest, handle_list_sections};
use crate::tools::search::{SearchRequest, handle_search};
use crate::tools::set_corpus::{SetCorpusRequest, format_response, handle_set_corpus};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

/// MCP Server for Doxygen symbol search
#[derive(Clone)]
pub struct SearchServer {
    /// Shared index state (loaded sections, current corpus, config)
    state: Arc<IndexState>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for SearchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchServer")
            .field("state", &self.state)
            .finish()
    }
}

#[tool_router]
impl SearchServer {
    pub fn new(config: Config) -> Self {
        Self::with_state(Arc::new(IndexState::new(config)))
    }

    pub fn with_state(state: Arc<IndexState>) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub fn state(&self) -> &Arc<IndexState> {
        &self.state
    }

    #[tool(
        description = "Configure the documentation corpus: the HTML output directory of a Doxygen run (or its search/ subdirectory). Lists the search sections it provides."
    )]
    async fn set_corpus(
        &self,
        Parameters(SetCorpusRequest { path }): Parameters<SetCorpusRequest>,
    ) -> std::result::Result<String, String> {
        let (corpus, changed) = handle_set_corpus(&self.state, &path)
            .await
            .map_err(|e| format!("Failed to set corpus: {}", e))?;

        Ok(format_response(&corpus, changed))
    }

    #[tool(
        description = "Find documented symbols whose name starts with the query. Matching is case-insensitive and ignores surrounding whitespace. Returns each symbol with its scope and documentation page. Searches the 'all' section unless another section is given.",
        input_schema = inline_schema_for_type::<SearchRequest>()
    )]
    async fn search(
        &self,
        Parameters(request): Parameters<SearchRequest>,
    ) -> std::result::Result<String, String> {
        handle_search(&self.state, request).await
    }

    #[tool(
        description = "List the search sections of the current corpus (all, classes, functions, ...) with their shard counts and whether they are loaded.",
        input_schema = inline_schema_for_type::<ListSectionsRequest>()
    )]
    async fn list_sections(
        &self,
        Parameters(request): Parameters<ListSectionsRequest>,
    ) -> std::result::Result<String, String> {
        handle_list_sections(&self.state, request).await
    }
}

#[tool_handler]
impl ServerHandler for SearchServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.protocol_version = ProtocolVersion::V_2024_11_05;
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = Implementation::from_build_env();
        info.instructions = Some(
            "doxsearch-mcp: prefix search over Doxygen-generated documentation. \
             The corpus is detected automatically on startup when possible. \
             Use set_corpus to point at a generated HTML directory, list_sections to see \
             what can be searched, and search to look up symbols by name prefix."
                .to_string(),
        );
        info
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this function sets `inline_subschemas = true`
/// to generate inline enum definitions instead of $ref patterns.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}
