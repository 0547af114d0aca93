use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of search results when the caller does not ask for a count.
pub const DEFAULT_NUM_RESULTS: usize = 5;

/// Total budget (connect + read) for one page fetch.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Identification sent with every page fetch. Plain enough to get past basic bot filters.
pub const FETCH_USER_AGENT: &str = "Mozilla/5.0";

/// Prefix of the single-element list returned when a search fails.
pub const SEARCH_ERROR_PREFIX: &str = "Error performing Google search: ";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

impl Error {
    /// Message without the category prefix, for embedding in caller-facing strings.
    pub fn detail(&self) -> &str {
        match self {
            Self::InvalidUrl(s) | Self::Fetch(s) | Self::Search(s) | Self::NotConfigured(s) => s,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Render an error with its `source()` chain, `outer: inner: innermost`.
///
/// reqwest's top-level messages ("error sending request for url ...") hide the
/// actual cause (DNS, refused, TLS), which lives further down the chain.
pub fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut out = e.to_string();
    let mut cur = e.source();
    while let Some(s) = cur {
        let msg = s.to_string();
        if !msg.is_empty() && !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        cur = s.source();
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    /// Where the request ended up after redirects.
    pub final_url: String,
    pub status: u16,
    /// Body decoded to text using the response charset. Empty unless `status == 200`.
    pub body: String,
}

impl FetchResponse {
    pub fn redirected(&self) -> bool {
        self.final_url != self.url
    }
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    /// Perform one request. Any HTTP status is returned as data; `Err` means
    /// the exchange itself failed (bad URL, DNS, connect, TLS, timeout, body).
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_NUM_RESULTS,
        }
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Provider relevance order.
    pub results: Vec<SearchResult>,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, q: &SearchQuery) -> Result<SearchResponse>;
}
