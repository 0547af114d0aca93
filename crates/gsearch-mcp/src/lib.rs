//! `gsearch-mcp` crate (library surface).
//!
//! The primary entrypoint is the `gsearch-mcp` binary: an MCP stdio server
//! exposing `google_search_tool` and `fetch_page_text`, plus `search`/`fetch`
//! subcommands that run the same operations once from a shell.

/// Name the MCP server announces to clients.
pub const SERVER_NAME: &str = "google_search";
