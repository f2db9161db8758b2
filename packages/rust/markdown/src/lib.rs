//! HTML-to-Markdown normalization for PubNub documentation pages.
//!
//! Converts fetched HTML into Markdown using the `htmd` crate, then applies
//! cleanup passes and the credential placeholder substitution. Non-content
//! elements are removed from the parsed DOM before any text is extracted.

mod cleanup;
mod placeholders;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use pubnub_mcp_shared::{PubNubMcpError, Result};

pub use placeholders::{CREDENTIAL_PLACEHOLDERS, substitute_credentials};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Options for [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct NormalizeOptions {
    /// Narrow to the first `<article>`; a page without one is an error.
    pub article: bool,
    /// Also drop `<header>` and `<footer>` elements (page chrome).
    pub strip_chrome: bool,
    /// Page URL used to resolve relative links.
    pub source_url: Option<Url>,
}

impl NormalizeOptions {
    /// Options used for live documentation pages.
    pub fn documentation_page(source_url: Url) -> Self {
        Self {
            article: true,
            strip_chrome: true,
            source_url: Some(source_url),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Normalize an HTML page (or already-clean Markdown) to Markdown.
///
/// 1. Drops `<script>`/`<style>` (plus `<header>`/`<footer>` when `strip_chrome`)
///    and unwraps inline `<span>`/`<font>` wrappers
/// 2. Narrows to the first `<article>` when `article` is set
/// 3. Converts tables, then HTML → Markdown via `htmd`
/// 4. Runs the cleanup pipeline
/// 5. Rewrites example credentials to configuration tokens
///
/// Input with no HTML markup skips steps 1–3.
#[instrument(skip(input, opts), fields(len = input.len(), article = opts.article))]
pub fn normalize(input: &str, opts: &NormalizeOptions) -> Result<String> {
    let markdown = if looks_like_html(input) {
        let content_html = extract_content_html(input, opts)?;
        let (content_html, tables) = extract_tables(&content_html);
        restore_tables(&html_to_markdown(&content_html)?, &tables)
    } else {
        debug!("input has no markup, skipping HTML conversion");
        input.to_string()
    };

    let cleaned = cleanup::run_pipeline(&markdown, opts.source_url.as_ref());
    let result = substitute_credentials(&cleaned);

    debug!(final_len = result.len(), "normalization complete");
    Ok(result)
}

fn html_to_markdown(html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "iframe", "noscript", "svg"])
        .build();

    converter
        .convert(html)
        .map_err(|e| PubNubMcpError::Conversion(format!("htmd conversion failed: {e}")))
}

/// Whether the text carries structural HTML rather than Markdown.
///
/// Fenced blocks and inline code spans are ignored, so Markdown that quotes
/// HTML samples is not mistaken for a page.
fn looks_like_html(input: &str) -> bool {
    static CODE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```.*?```|`[^`\n]*`").expect("valid regex"));
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)<(?:!doctype|html|head|body|article|main|div|p|h[1-6]|ul|ol|li|pre|code|table|section|script|style|header|footer|nav|a)[\s>/]",
        )
        .expect("valid regex")
    });

    TAG_RE.is_match(&CODE_RE.replace_all(input, ""))
}

// ---------------------------------------------------------------------------
// DOM extraction
// ---------------------------------------------------------------------------

static ALWAYS_REMOVED: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style").expect("valid selector"));
static CHROME: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("header, footer").expect("valid selector"));
static ARTICLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article").expect("valid selector"));
static BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("valid selector"));
static INLINE_WRAPPERS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, font").expect("valid selector"));

/// Parse the page, detach non-content nodes, and return the HTML to convert.
fn extract_content_html(html: &str, opts: &NormalizeOptions) -> Result<String> {
    let mut doc = Html::parse_document(html);

    detach_all(&mut doc, &ALWAYS_REMOVED);
    if opts.strip_chrome {
        detach_all(&mut doc, &CHROME);
    }
    unwrap_all(&mut doc, &INLINE_WRAPPERS);

    if opts.article {
        return doc
            .select(&ARTICLE)
            .next()
            .map(|el| el.inner_html())
            .ok_or_else(|| PubNubMcpError::parse("no <article> element found"));
    }

    Ok(doc
        .select(&BODY)
        .next()
        .map(|body| body.inner_html())
        .unwrap_or_else(|| doc.root_element().html()))
}

/// Remove every element matching `selector` from the tree.
fn detach_all(doc: &mut Html, selector: &Selector) {
    let ids: Vec<_> = doc.select(selector).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Replace every element matching `selector` with its children.
fn unwrap_all(doc: &mut Html, selector: &Selector) {
    let ids: Vec<_> = doc.select(selector).map(|el| el.id()).collect();
    for id in ids {
        let children: Vec<_> = match doc.tree.get(id) {
            Some(node) if node.parent().is_some() => node.children().map(|c| c.id()).collect(),
            _ => continue,
        };
        if let Some(mut node) = doc.tree.get_mut(id) {
            for child in children {
                node.insert_id_before(child);
            }
            node.detach();
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Swap each `<table>` for a placeholder paragraph and render it separately.
///
/// `htmd` 0.1 has no table support and collapses whitespace in text, so the
/// rendered tables are spliced back in by [`restore_tables`] after conversion.
fn extract_tables(html: &str) -> (String, Vec<String>) {
    static TABLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("table").expect("valid selector"));

    let fragment = Html::parse_fragment(html);
    let mut result = html.to_string();
    let mut tables = Vec::new();
    for table in fragment.select(&TABLE) {
        let token = table_token(tables.len());
        let replaced = result.replacen(&table.html(), &format!("<p>{token}</p>"), 1);
        if replaced != result {
            result = replaced;
            tables.push(table_to_markdown(&table));
        }
    }
    (result, tables)
}

fn restore_tables(markdown: &str, tables: &[String]) -> String {
    tables
        .iter()
        .enumerate()
        .fold(markdown.to_string(), |md, (i, table)| md.replacen(&table_token(i), table, 1))
}

fn table_token(index: usize) -> String {
    format!("PNMDTABLE{index}X")
}

fn table_to_markdown(table: &ElementRef) -> String {
    static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
    static CELL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));

    let rows: Vec<Vec<String>> = table
        .select(&ROW)
        .map(|tr| {
            tr.select(&CELL)
                .map(|cell| {
                    let text = cell.text().collect::<Vec<_>>().join(" ");
                    text.split_whitespace().collect::<Vec<_>>().join(" ").replace('|', "\\|")
                })
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect();

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let render = |cells: &[String]| {
        let padded: Vec<&str> = (0..width)
            .map(|i| cells.get(i).map(String::as_str).unwrap_or(""))
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut md = render(&rows[0]);
    md.push_str(&format!("|{}\n", " --- |".repeat(width)));
    for row in &rows[1..] {
        md.push_str(&render(row));
    }
    md.trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> String {
        format!("<!DOCTYPE html><html><head><title>PubNub Docs</title></head><body>{body}</body></html>")
    }

    fn article_opts() -> NormalizeOptions {
        NormalizeOptions::documentation_page(
            Url::parse("https://www.pubnub.com/docs/sdks/javascript").unwrap(),
        )
    }

    #[test]
    fn converts_article_content() {
        let html = page(
            "<header>Site nav</header>\
             <article><h1>JavaScript SDK</h1><p>Install with <code>npm install pubnub</code>.</p>\
             <ul><li>Publish</li><li>Subscribe</li></ul></article>\
             <footer>Copyright PubNub</footer>",
        );
        let md = normalize(&html, &article_opts()).unwrap();

        assert!(md.contains("# JavaScript SDK"));
        assert!(md.contains("npm install pubnub"));
        assert!(md.contains("Publish"));
        assert!(!md.contains("Site nav"));
        assert!(!md.contains("Copyright PubNub"));
    }

    #[test]
    fn scripts_and_styles_removed_from_dom() {
        let html = page(
            "<article><h2>Presence</h2><script>var tracker = 'analytics';</script>\
             <style>.x { color: red }</style><p>Who is online.</p></article>",
        );
        let md = normalize(&html, &article_opts()).unwrap();
        assert!(md.contains("Who is online."));
        assert!(!md.contains("analytics"));
        assert!(!md.contains("color: red"));
    }

    #[test]
    fn missing_article_is_an_error() {
        let html = page("<main><h1>Not an article</h1></main>");
        let err = normalize(&html, &article_opts()).unwrap_err();
        assert!(err.to_string().contains("no <article> element found"));
    }

    #[test]
    fn without_article_flag_uses_body() {
        let html = page("<main><h1>Overview</h1><p>Body text.</p></main>");
        let md = normalize(&html, &NormalizeOptions::default()).unwrap();
        assert!(md.contains("# Overview"));
        assert!(md.contains("Body text."));
    }

    #[test]
    fn header_kept_unless_chrome_stripped() {
        let html = page("<article><header><h1>Title in header</h1></header><p>Text</p></article>");
        let opts = NormalizeOptions {
            article: true,
            ..NormalizeOptions::default()
        };
        let md = normalize(&html, &opts).unwrap();
        assert!(md.contains("Title in header"));
    }

    #[test]
    fn example_credentials_substituted() {
        let html = page(
            r#"<article><pre><code class="language-javascript">const pubnub = new PubNub({
  publishKey: "myPublishKey",
  subscribeKey: "mySubscribeKey",
});</code></pre></article>"#,
        );
        let md = normalize(&html, &article_opts()).unwrap();
        assert!(md.contains("```javascript"));
        assert!(md.contains("PUBNUB_PUBLISH_KEY"));
        assert!(md.contains("PUBNUB_SUBSCRIBE_KEY"));
        assert!(!md.contains("myPublishKey"));
    }

    #[test]
    fn tables_become_markdown_tables() {
        let html = page(
            "<article><h2>Parameters</h2><table>\
             <thead><tr><th>Parameter</th><th>Type</th></tr></thead>\
             <tbody><tr><td>channel</td><td>String</td></tr>\
             <tr><td>message</td><td>Object</td></tr></tbody></table></article>",
        );
        let md = normalize(&html, &article_opts()).unwrap();
        assert!(md.contains("| Parameter | Type |"));
        assert!(md.contains("| --- | --- |"));
        assert!(md.contains("| channel | String |\n| message | Object |"));
        assert!(!md.contains("PNMDTABLE"));
    }

    #[test]
    fn relative_links_resolved() {
        let html = page(r#"<article><p>See <a href="/docs/general/presence/overview">presence</a>.</p></article>"#);
        let md = normalize(&html, &article_opts()).unwrap();
        assert!(md.contains("(https://www.pubnub.com/docs/general/presence/overview)"));
    }

    #[test]
    fn normalizing_output_again_changes_nothing() {
        let html = page(
            "<article><h1>Storage</h1><p>Fetch <strong>history</strong> with mySubscribeKey.</p>\
             <ol><li>Enable persistence</li><li>Call fetchMessages</li></ol>\
             <p>Load the SDK from the CDN inside a <code>&lt;div&gt;</code>-free page:</p>\
             <pre><code class=\"language-html\">&lt;script src=\"https://cdn.pubnub.com/sdk/javascript/pubnub.min.js\"&gt;&lt;/script&gt;</code></pre>\
             </article>",
        );
        let once = normalize(&html, &article_opts()).unwrap();
        assert!(once.contains("<script src=\"https://cdn.pubnub.com/sdk/javascript/pubnub.min.js\"></script>"));

        let twice = normalize(&once, &NormalizeOptions::default()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn inline_code_with_tags_survives() {
        let html = page(
            "<article><p>Wrap the widget in a <code>&lt;div&gt;</code> or \
             <code>&lt;span class=\"x\"&gt;</code> element.</p></article>",
        );
        let md = normalize(&html, &article_opts()).unwrap();
        assert!(md.contains("`<div>`"));
        assert!(md.contains("`<span class=\"x\">`"));
    }

    #[test]
    fn inline_wrappers_unwrapped_in_dom() {
        let html = page(
            "<article><p><span class=\"badge\">Beta</span> features use \
             <font color=\"red\">Presence</font>.</p></article>",
        );
        let md = normalize(&html, &article_opts()).unwrap();
        assert!(md.contains("Beta features use Presence."));
        assert!(!md.contains("<span"));
        assert!(!md.contains("<font"));
    }

    #[test]
    fn plain_markdown_is_not_reparsed() {
        assert!(!looks_like_html("# Title\n\nUse `Vec<String>` here."));
        assert!(!looks_like_html("Wrap it in a `<div>` element."));
        assert!(!looks_like_html("```html\n<script src=\"pubnub.min.js\"></script>\n```\n"));
        assert!(looks_like_html("<p>paragraph</p>"));
        assert!(looks_like_html("<!DOCTYPE html><html></html>"));
    }
}
