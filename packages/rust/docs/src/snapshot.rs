//! Bundle remote documentation articles into one local Markdown resource.
//!
//! Used to refresh files under the resources directory (for example the
//! objects or chat SDK guides) from their live pages.

use tracing::{info, instrument, warn};
use url::Url;

use pubnub_mcp_markdown::NormalizeOptions;

use crate::fetch::{HttpFetcher, fetch_markdown};

/// Outcome of [`snapshot_articles`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotResult {
    /// Successful articles joined by blank lines, in input order.
    pub markdown: String,
    /// URLs that contributed content.
    pub fetched: Vec<Url>,
    /// URLs that were skipped, with the reason.
    pub failed: Vec<(Url, String)>,
}

/// Fetch each URL's `<article>` as Markdown, skipping pages that fail.
#[instrument(skip_all, fields(urls = urls.len()))]
pub async fn snapshot_articles<F: HttpFetcher>(fetcher: &F, urls: &[Url]) -> SnapshotResult {
    let mut parts = Vec::new();
    let mut result = SnapshotResult::default();

    for url in urls {
        let opts = NormalizeOptions {
            article: true,
            strip_chrome: false,
            source_url: Some(url.clone()),
        };
        match fetch_markdown(fetcher, url, &opts).await {
            Ok(markdown) => {
                info!(%url, "article captured");
                parts.push(markdown.trim_end().to_string());
                result.fetched.push(url.clone());
            }
            Err(e) => {
                warn!(%url, error = %e, "skipping article");
                result.failed.push((url.clone(), e.to_string()));
            }
        }
    }

    result.markdown = parts.join("\n\n");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::fetch::ReqwestFetcher;

    #[tokio::test]
    async fn joins_successes_and_records_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/general/metadata/basics"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><header><p>Metadata guide</p></header><article><h1>Basics</h1></article></body></html>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/general/metadata/filtering"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><article><h1>Filtering</h1></article></body></html>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/general/metadata/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let urls: Vec<Url> = ["basics", "missing", "filtering"]
            .iter()
            .map(|p| Url::parse(&format!("{}/general/metadata/{p}", server.uri())).unwrap())
            .collect();

        let fetcher = ReqwestFetcher::new(5).unwrap();
        let result = snapshot_articles(&fetcher, &urls).await;

        assert_eq!(result.fetched.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].1, "404 Not Found");
        assert_eq!(result.markdown, "# Basics\n\n# Filtering");
    }
}
