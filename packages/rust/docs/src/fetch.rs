//! HTTP fetch seam for documentation pages.
//!
//! Everything that talks to the network goes through [`HttpFetcher`], so the
//! pipeline can be driven by a mock server or a stub in tests.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use pubnub_mcp_markdown::{NormalizeOptions, normalize};
use pubnub_mcp_shared::{PubNubMcpError, Result};

/// User-Agent string for documentation requests.
const USER_AGENT: &str = concat!("pubnub-mcp/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed per request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Fetch seam
// ---------------------------------------------------------------------------

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    /// Canonical reason phrase (`"Not Found"`), empty when unknown.
    pub status_text: String,
    pub body: String,
}

impl FetchResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs `GET` requests. Non-2xx statuses are returned, not raised.
pub trait HttpFetcher: Send + Sync {
    fn get(&self, url: &Url) -> impl Future<Output = Result<FetchResponse>> + Send;
}

impl<T: HttpFetcher> HttpFetcher for &T {
    fn get(&self, url: &Url) -> impl Future<Output = Result<FetchResponse>> + Send {
        (**self).get(url)
    }
}

/// [`HttpFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Build a fetcher whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PubNubMcpError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PubNubMcpError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PubNubMcpError::Network(format!("failed to read body: {e}")))?;

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Fetch + normalize
// ---------------------------------------------------------------------------

/// Why a remote page could not contribute content.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("{status} {status_text}")]
    Status { status: u16, status_text: String },

    /// The request never completed.
    #[error("{0}")]
    Transport(PubNubMcpError),

    /// The page arrived but could not be normalized (e.g. no `<article>`).
    #[error("{0}")]
    Content(PubNubMcpError),
}

/// Fetch `url` and normalize the page to Markdown.
///
/// A non-2xx status is treated exactly like a transport failure.
#[instrument(skip(fetcher, opts), fields(url = %url))]
pub async fn fetch_markdown<F: HttpFetcher>(
    fetcher: &F,
    url: &Url,
    opts: &NormalizeOptions,
) -> std::result::Result<String, FetchError> {
    let response = fetcher.get(url).await.map_err(FetchError::Transport)?;

    if !response.is_success() {
        return Err(FetchError::Status {
            status: response.status,
            status_text: response.status_text,
        });
    }

    debug!(bytes = response.body.len(), "page fetched");
    normalize(&response.body, opts).map_err(FetchError::Content)
}
