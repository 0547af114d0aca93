use crate::env;
use gsearch_core::{
    error_chain, Error, Result, SearchProvider, SearchQuery, SearchResponse, SearchResult,
};
use html_scraper::{Html, Selector};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const GOOGLE_ENDPOINT: &str = "https://www.google.com/search";

/// Google serves its plain, JS-free result page to text browsers.
const GOOGLE_USER_AGENT: &str = "Lynx/2.8.9rel.1 libwww-FM/2.14";

/// Pre-answered consent so EU traffic doesn't land on the consent interstitial.
const GOOGLE_CONSENT_COOKIES: &str = "CONSENT=PENDING+987; SOCS=CAESHAgBEhIaAB";

const GOOGLE_TIMEOUT: Duration = Duration::from_secs(5);

const SEARXNG_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct GoogleSearchProvider {
    client: reqwest::Client,
    endpoint: String,
    lang: String,
    region: Option<String>,
    safe: String,
    sleep_between_pages: Duration,
}

impl GoogleSearchProvider {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            lang: "en".to_string(),
            region: None,
            safe: "active".to_string(),
            sleep_between_pages: Duration::ZERO,
        }
    }

    pub fn from_env(client: reqwest::Client) -> Self {
        let endpoint = env("GSEARCH_GOOGLE_ENDPOINT").unwrap_or_else(|| GOOGLE_ENDPOINT.to_string());
        let mut p = Self::new(client, endpoint);
        if let Some(lang) = env("GSEARCH_GOOGLE_LANG") {
            p.lang = lang;
        }
        p.region = env("GSEARCH_GOOGLE_REGION");
        if let Some(safe) = env("GSEARCH_GOOGLE_SAFE") {
            p.safe = safe;
        }
        if let Some(ms) = env("GSEARCH_GOOGLE_SLEEP_MS").and_then(|s| s.parse::<u64>().ok()) {
            p.sleep_between_pages = Duration::from_millis(ms);
        }
        p
    }

    async fn fetch_page(
        &self,
        q: &SearchQuery,
        num: usize,
        start: usize,
    ) -> Result<String> {
        let mut req = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::USER_AGENT, GOOGLE_USER_AGENT)
            .header(reqwest::header::ACCEPT, "*/*")
            .header(reqwest::header::COOKIE, GOOGLE_CONSENT_COOKIES)
            .query(&[
                ("q", q.query.as_str()),
                ("num", &num.to_string()),
                ("hl", self.lang.as_str()),
                ("start", &start.to_string()),
                ("safe", &self.safe),
            ]);
        if let Some(gl) = self.region.as_deref() {
            req = req.query(&[("gl", gl)]);
        }

        let resp = req
            .timeout(GOOGLE_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Search(error_chain(&e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("google search HTTP {status}")));
        }
        resp.text()
            .await
            .map_err(|e| Error::Search(error_chain(&e)))
    }
}

/// Decode a Google redirect href (`/url?q=<target>&sa=...`) into its target.
fn decode_google_href(href: &str) -> Option<String> {
    let head = href.split('&').next().unwrap_or("");
    let target = head.strip_prefix("/url?q=").unwrap_or(head);
    let decoded = percent_decode_str(target).decode_utf8_lossy().into_owned();
    let parsed = url::Url::parse(&decoded).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(decoded)
}

/// Parse one Google result page into results, in page order.
pub fn parse_google_results(html: &str) -> Vec<SearchResult> {
    let doc = Html::parse_document(html);
    let (Ok(block_sel), Ok(link_sel), Ok(redirect_sel)) = (
        Selector::parse("div.ezO2md"),
        Selector::parse("a[href]"),
        Selector::parse(r#"a[href^="/url?q="]"#),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut blocks = doc.select(&block_sel).peekable();
    if blocks.peek().is_some() {
        for block in blocks {
            let Some(a) = block.select(&link_sel).next() else {
                continue;
            };
            let Some(url) = a.value().attr("href").and_then(decode_google_href) else {
                continue;
            };
            out.push(SearchResult { url });
        }
    } else {
        // Layout changed: fall back to any redirect anchor on the page.
        for a in doc.select(&redirect_sel) {
            let Some(url) = a.value().attr("href").and_then(decode_google_href) else {
                continue;
            };
            out.push(SearchResult { url });
        }
    }
    out
}

#[async_trait::async_trait]
impl SearchProvider for GoogleSearchProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn search(&self, q: &SearchQuery) -> Result<SearchResponse> {
        let t0 = Instant::now();
        let mut results: Vec<SearchResult> = Vec::new();
        let mut start = 0usize;
        let mut pages = 0u32;

        while results.len() < q.max_results {
            if pages > 0 && !self.sleep_between_pages.is_zero() {
                tokio::time::sleep(self.sleep_between_pages).await;
            }
            let remaining = q.max_results - results.len();
            let body = self.fetch_page(q, remaining + 2, start).await?;
            pages += 1;

            let page = parse_google_results(&body);
            if page.is_empty() {
                break;
            }
            start += page.len();
            results.extend(page.into_iter().take(remaining));
        }

        tracing::debug!(
            provider = "google",
            pages,
            results = results.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(SearchResponse { results })
    }
}

pub fn searxng_endpoints_from_env() -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    // Comma/whitespace-separated list of endpoints for simple load spreading.
    if let Some(v) = env("GSEARCH_SEARXNG_ENDPOINTS") {
        for raw in v.split(|c: char| c == ',' || c.is_whitespace()) {
            let s = raw.trim();
            if s.is_empty() {
                continue;
            }
            let s = s.to_string();
            if !out.contains(&s) {
                out.push(s);
            }
        }
    }

    if let Some(s) = env("GSEARCH_SEARXNG_ENDPOINT") {
        if !out.contains(&s) {
            out.push(s);
        }
    }

    out
}

#[derive(Debug, Clone)]
pub struct SearxngSearchProvider {
    client: reqwest::Client,
    endpoints: Vec<String>,
}

impl SearxngSearchProvider {
    pub fn new(client: reqwest::Client, endpoints: Vec<String>) -> Self {
        Self { client, endpoints }
    }

    /// Missing endpoints are reported per call, not at construction.
    pub fn from_env(client: reqwest::Client) -> Self {
        Self::new(client, searxng_endpoints_from_env())
    }

    fn endpoint_search_for(base_endpoint: &str) -> String {
        // Accept either a base URL (…/), or a full /search endpoint.
        let mut base = base_endpoint.trim().trim_end_matches('/').to_string();
        if !base.ends_with("/search") {
            base.push_str("/search");
        }
        base
    }

    fn stable_hash64(query: &SearchQuery) -> u64 {
        // FNV-1a; stable across runs unlike HashMap's RandomState.
        let mut h: u64 = 1469598103934665603;
        for b in query.query.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(1099511628211);
        }
        h
    }

    fn pick_endpoint_index(&self, q: &SearchQuery) -> usize {
        if self.endpoints.is_empty() {
            return 0;
        }
        (Self::stable_hash64(q) as usize) % self.endpoints.len()
    }
}

#[derive(Debug, Deserialize)]
struct SearxngSearchResponse {
    results: Option<Vec<SearxngResult>>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    url: Option<String>,
}

#[async_trait::async_trait]
impl SearchProvider for SearxngSearchProvider {
    fn name(&self) -> &'static str {
        "searxng"
    }

    async fn search(&self, q: &SearchQuery) -> Result<SearchResponse> {
        let Some(base_endpoint) = self.endpoints.get(self.pick_endpoint_index(q)) else {
            return Err(Error::NotConfigured(
                "missing GSEARCH_SEARXNG_ENDPOINT (or GSEARCH_SEARXNG_ENDPOINTS)".to_string(),
            ));
        };
        let t0 = Instant::now();
        if q.max_results == 0 {
            return Ok(SearchResponse::default());
        }

        let resp = self
            .client
            .get(Self::endpoint_search_for(base_endpoint))
            .query(&[("q", q.query.as_str()), ("format", "json")])
            .timeout(SEARXNG_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Search(error_chain(&e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("searxng search HTTP {status}")));
        }
        let parsed: SearxngSearchResponse = resp
            .json()
            .await
            .map_err(|e| Error::Search(error_chain(&e)))?;

        let results: Vec<SearchResult> = parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(|r| r.url.map(|url| SearchResult { url }))
            .take(q.max_results)
            .collect();

        tracing::debug!(
            provider = "searxng",
            results = results.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(SearchResponse { results })
    }
}

/// Provider selected by `GSEARCH_SEARCH_PROVIDER`: `google` (default) or `searxng`.
pub fn provider_name_from_env() -> &'static str {
    match env("GSEARCH_SEARCH_PROVIDER")
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        None | Some("google") => "google",
        Some("searxng") => "searxng",
        Some(other) => {
            tracing::warn!(provider = other, "unknown GSEARCH_SEARCH_PROVIDER; using google");
            "google"
        }
    }
}

pub fn provider_from_env(client: reqwest::Client) -> Arc<dyn SearchProvider> {
    match provider_name_from_env() {
        "searxng" => Arc::new(SearxngSearchProvider::from_env(client)),
        _ => Arc::new(GoogleSearchProvider::from_env(client)),
    }
}
