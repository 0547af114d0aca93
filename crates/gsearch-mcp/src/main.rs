use anyhow::Result;
use clap::{Parser, Subcommand};
use gsearch_local::{ops, search, LocalFetcher};

#[cfg(feature = "stdio")]
mod mcp;

#[derive(Parser, Debug)]
#[command(name = "gsearch-mcp")]
#[command(about = "Google search + page text tools (MCP stdio server)", long_about = None)]
struct Cli {
    /// Defaults to `mcp-stdio`.
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as an MCP stdio server (for MCP clients).
    #[cfg(feature = "stdio")]
    McpStdio,
    /// Run one search and print the URL list the tool would return.
    Search(SearchCmd),
    /// Fetch one URL and print the text the tool would return.
    Fetch(FetchCmd),
}

#[derive(clap::Args, Debug)]
struct SearchCmd {
    /// Search query.
    #[arg(long)]
    query: String,
    /// Number of results (values <= 0 return an empty list).
    #[arg(long, default_value_t = gsearch_core::DEFAULT_NUM_RESULTS as i64, allow_negative_numbers = true)]
    num_results: i64,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct FetchCmd {
    /// URL to fetch.
    #[arg(long)]
    url: String,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

fn init_logging() {
    // stdout carries the MCP stream; logs go to stderr.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn is_text(output: &str) -> bool {
    output.eq_ignore_ascii_case("text")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        #[cfg(feature = "stdio")]
        None | Some(Commands::McpStdio) => {
            mcp::serve_stdio()
                .await
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        }
        #[cfg(not(feature = "stdio"))]
        None => {
            anyhow::bail!("built without the `stdio` feature; pass a subcommand (see --help)");
        }
        Some(Commands::Search(args)) => {
            let client = gsearch_local::oneshot_client_builder().build()?;
            let provider = search::provider_from_env(client);
            let urls = ops::google_search(provider.as_ref(), &args.query, args.num_results).await;
            if is_text(&args.output) {
                for u in urls {
                    println!("{u}");
                }
            } else {
                println!("{}", serde_json::json!(urls));
            }
        }
        Some(Commands::Fetch(args)) => {
            let fetcher = LocalFetcher::new()?;
            let text = ops::fetch_page_text(&fetcher, &args.url).await;
            if is_text(&args.output) {
                println!("{text}");
            } else {
                println!("{}", serde_json::json!(text));
            }
        }
    }
    Ok(())
}
