//! Failure-isolating execution of a [`SourcePlan`].
//!
//! Every source produces exactly one fragment. A failing source yields a
//! visible error fragment and never prevents the remaining sources from
//! running. The configuration snippet is appended even when everything failed.

use std::io::ErrorKind;

use tracing::{debug, info, instrument, warn};
use url::Url;

use pubnub_mcp_markdown::NormalizeOptions;
use pubnub_mcp_shared::Credentials;

use crate::fetch::{HttpFetcher, fetch_markdown};
use crate::resolver::{SourcePlan, SourceRef};
use crate::snippet::configuration_snippet;

/// Content contributed by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFragment {
    pub origin: SourceRef,
    /// Markdown on success, a human-readable error otherwise.
    pub text: String,
    pub ok: bool,
}

impl ContentFragment {
    fn success(origin: SourceRef, text: String) -> Self {
        Self {
            origin,
            text,
            ok: true,
        }
    }

    fn failure(origin: SourceRef, text: String) -> Self {
        Self {
            origin,
            text,
            ok: false,
        }
    }
}

/// Fragments in plan order plus the trailing snippet.
#[derive(Debug, Clone)]
pub struct AggregatedDocument {
    pub fragments: Vec<ContentFragment>,
    pub snippet: String,
}

impl AggregatedDocument {
    /// Join non-empty fragments and the snippet with blank lines.
    pub fn text(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.trim_end())
            .filter(|t| !t.is_empty())
            .chain(std::iter::once(self.snippet.trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Number of sources that failed.
    pub fn failures(&self) -> usize {
        self.fragments.iter().filter(|f| !f.ok).count()
    }
}

/// Executes plans against a fetcher and the local filesystem.
#[derive(Debug, Clone)]
pub struct Aggregator<F> {
    fetcher: F,
    snippet: String,
}

impl<F: HttpFetcher> Aggregator<F> {
    /// The snippet is rendered once from `credentials` and reused for every request.
    pub fn new(fetcher: F, credentials: &Credentials) -> Self {
        Self {
            fetcher,
            snippet: configuration_snippet(credentials),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run every source in plan order.
    #[instrument(skip_all, fields(sources = plan.len()))]
    pub async fn aggregate(&self, plan: &SourcePlan) -> AggregatedDocument {
        let mut fragments = Vec::with_capacity(plan.len());
        for source in plan {
            fragments.push(self.execute(source).await);
        }

        let document = AggregatedDocument {
            fragments,
            snippet: self.snippet.clone(),
        };
        info!(failures = document.failures(), "aggregation complete");
        document
    }

    async fn execute(&self, source: &SourceRef) -> ContentFragment {
        match source {
            SourceRef::Remote { url } => self.fetch_remote(url, source).await,
            SourceRef::Local { path, optional } => match tokio::fs::read_to_string(path).await {
                Ok(text) => ContentFragment::success(source.clone(), text),
                Err(e) if *optional && e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no supplement file");
                    ContentFragment::success(source.clone(), String::new())
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "local source failed");
                    ContentFragment::failure(
                        source.clone(),
                        format!("Error reading {}: {e}", path.display()),
                    )
                }
            },
        }
    }

    async fn fetch_remote(&self, url: &Url, source: &SourceRef) -> ContentFragment {
        let opts = NormalizeOptions::documentation_page(url.clone());
        match fetch_markdown(&self.fetcher, url, &opts).await {
            Ok(markdown) => ContentFragment::success(source.clone(), markdown),
            Err(e) => {
                warn!(%url, error = %e, "remote source failed");
                ContentFragment::failure(source.clone(), format!("Error fetching {url}: {e}"))
            }
        }
    }
}
