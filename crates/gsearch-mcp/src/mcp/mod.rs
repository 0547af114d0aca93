use gsearch_core::{FetchBackend, SearchProvider, DEFAULT_NUM_RESULTS};
use gsearch_local::{ops, search, LocalFetcher};
use rmcp::{
    handler::server::router::tool::ToolRouter as RmcpToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    transport::stdio,
    ErrorData as McpError, ServiceExt,
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

mod envelope;
use envelope::*;

fn default_num_results() -> i64 {
    DEFAULT_NUM_RESULTS as i64
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(crate) struct GoogleSearchArgs {
    /// The search query.
    query: String,
    /// Number of results to fetch.
    #[serde(default = "default_num_results")]
    num_results: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub(crate) struct FetchPageTextArgs {
    /// The URL to fetch.
    url: String,
}

#[derive(Clone)]
pub(crate) struct GSearchMcp {
    tool_router: RmcpToolRouter<Self>,
    provider: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn FetchBackend>,
}

#[tool_router]
impl GSearchMcp {
    pub(crate) fn new() -> Result<Self, McpError> {
        let client = gsearch_local::oneshot_client_builder()
            .build()
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let fetcher =
            LocalFetcher::new().map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(Self::with_backends(
            search::provider_from_env(client),
            Arc::new(fetcher),
        ))
    }

    pub(crate) fn with_backends(
        provider: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn FetchBackend>,
    ) -> Self {
        Self {
            tool_router: Self::tool_router(),
            provider,
            fetcher,
        }
    }

    #[tool(description = "Perform a Google search and return the top URLs.")]
    async fn google_search_tool(
        &self,
        params: Parameters<GoogleSearchArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let t0 = std::time::Instant::now();
        let urls = ops::google_search(self.provider.as_ref(), &args.query, args.num_results).await;
        tracing::info!(
            tool = "google_search_tool",
            provider = self.provider.name(),
            num_results = args.num_results,
            returned = urls.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "tool call"
        );
        Ok(list_result(urls))
    }

    #[tool(description = "Fetch and return the cleaned text content of a webpage.")]
    async fn fetch_page_text(
        &self,
        params: Parameters<FetchPageTextArgs>,
    ) -> Result<CallToolResult, McpError> {
        let args = params.0;
        let t0 = std::time::Instant::now();
        let text = ops::fetch_page_text(self.fetcher.as_ref(), &args.url).await;
        tracing::info!(
            tool = "fetch_page_text",
            url = %args.url,
            chars = text.chars().count(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "tool call"
        );
        Ok(text_result(text))
    }
}

#[tool_handler]
impl rmcp::ServerHandler for GSearchMcp {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo {
            instructions: Some(
                "Google search (google_search_tool) and page text extraction (fetch_page_text). Failures are reported in the returned text, never as tool errors."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        };
        info.server_info.name = gsearch_mcp::SERVER_NAME.to_string();
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info
    }
}

pub(crate) async fn serve_stdio() -> Result<(), McpError> {
    let svc = GSearchMcp::new()?;
    tracing::info!(
        server = gsearch_mcp::SERVER_NAME,
        provider = svc.provider.name(),
        "serving MCP over stdio"
    );
    let running = svc
        .serve(stdio())
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    // Keep the stdio server alive until the client closes.
    running
        .waiting()
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(())
}
