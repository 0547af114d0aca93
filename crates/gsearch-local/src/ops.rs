//! The two tool operations, with every failure folded into the success shape.
//!
//! Internally each step returns `gsearch_core::Result`; only the functions at
//! the bottom of this module (`google_search`, `fetch_page_text`) collapse
//! errors into the strings callers see.

use crate::extract::{extract_text, ExtractedText};
use gsearch_core::{
    FetchBackend, FetchRequest, Result, SearchProvider, SearchQuery, SEARCH_ERROR_PREFIX,
};

/// Outcome of fetching one page, before it is rendered to a single string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Text(ExtractedText),
    /// The server answered with something other than 200.
    Status(u16),
    /// The exchange failed before a status was available.
    Failed(String),
}

impl PageOutcome {
    pub fn render(self, url: &str) -> String {
        match self {
            Self::Text(t) => t.content,
            Self::Status(code) => format!("Failed to fetch {url}, status code: {code}"),
            Self::Failed(details) => format!("Error fetching {url}: {details}"),
        }
    }
}

/// Map a tool-level result count onto a provider hint. Non-positive counts ask
/// for nothing; there is no upper bound beyond what `usize` holds.
pub fn clamp_num_results(num_results: i64) -> usize {
    if num_results <= 0 {
        0
    } else {
        usize::try_from(num_results).unwrap_or(usize::MAX)
    }
}

/// Ask the provider and keep at most `max_results` URLs, in provider order.
pub async fn search_urls(
    provider: &dyn SearchProvider,
    query: &str,
    max_results: usize,
) -> Result<Vec<String>> {
    let q = SearchQuery::new(query).with_max_results(max_results);
    let resp = provider.search(&q).await?;
    Ok(resp
        .results
        .into_iter()
        .take(max_results)
        .map(|r| r.url)
        .collect())
}

/// Search operation: URLs on success, otherwise a one-element list holding the error.
pub async fn google_search(
    provider: &dyn SearchProvider,
    query: &str,
    num_results: i64,
) -> Vec<String> {
    match search_urls(provider, query, clamp_num_results(num_results)).await {
        Ok(urls) => urls,
        Err(e) => {
            tracing::warn!(provider = provider.name(), error = %e, "search failed");
            vec![format!("{SEARCH_ERROR_PREFIX}{}", e.detail())]
        }
    }
}

/// Fetch `url` once and extract its text. Never returns an error.
pub async fn fetch_page(fetcher: &dyn FetchBackend, url: &str) -> PageOutcome {
    let resp = match fetcher.fetch(&FetchRequest::new(url)).await {
        Ok(r) => r,
        Err(e) => return PageOutcome::Failed(e.detail().to_string()),
    };
    if resp.redirected() {
        tracing::debug!(url, final_url = %resp.final_url, "followed redirects");
    }
    if resp.status != 200 {
        return PageOutcome::Status(resp.status);
    }

    // The parsed tree is !Send and parsing is CPU-bound: keep it off the async workers.
    match tokio::task::spawn_blocking(move || extract_text(&resp.body)).await {
        Ok(text) => PageOutcome::Text(text),
        Err(e) => PageOutcome::Failed(format!("text extraction failed: {e}")),
    }
}

/// Fetch operation: cleaned page text, or a sentence describing what went wrong.
pub async fn fetch_page_text(fetcher: &dyn FetchBackend, url: &str) -> String {
    let outcome = fetch_page(fetcher, url).await;
    match &outcome {
        PageOutcome::Text(t) => {
            tracing::debug!(url, chars = t.content.chars().count(), truncated = t.truncated, "page extracted")
        }
        PageOutcome::Status(code) => tracing::warn!(url, status = code, "fetch returned non-200"),
        PageOutcome::Failed(details) => tracing::warn!(url, error = %details, "fetch failed"),
    }
    outcome.render(url)
}
