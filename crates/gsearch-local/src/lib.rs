use gsearch_core::{
    error_chain, Error, FetchBackend, FetchRequest, FetchResponse, Result, FETCH_TIMEOUT,
    FETCH_USER_AGENT,
};
use std::time::{Duration, Instant};

pub mod extract;
pub mod ops;
pub mod search;

pub(crate) fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Client for one-shot requests: no idle connections are kept, so every call
/// opens (and closes) its own socket and nothing carries over between calls.
pub fn oneshot_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .pool_max_idle_per_host(0)
}

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
}

impl LocalFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// `timeout` covers connect, redirects and body read.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = oneshot_client_builder()
            .user_agent(FETCH_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Fetch(error_chain(&e)))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let t0 = Instant::now();
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(error_chain(&e)))?;

        let final_url = resp.url().to_string();
        let status = resp.status().as_u16();

        // Only successful pages are worth decoding; the status alone decides the rest.
        let body = if status == 200 {
            resp.text()
                .await
                .map_err(|e| Error::Fetch(error_chain(&e)))?
        } else {
            String::new()
        };

        tracing::debug!(url = %req.url, status, elapsed_ms = t0.elapsed().as_millis() as u64, "fetched");

        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status,
            body,
        })
    }
}
