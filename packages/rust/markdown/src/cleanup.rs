//! Post-conversion cleanup passes for Markdown output.
//!
//! Each pass is a function `&str -> String` applied in sequence, and every
//! pass is idempotent so re-normalizing already-clean Markdown is a no-op.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Run the full cleanup pipeline on raw Markdown text.
pub(crate) fn run_pipeline(md: &str, base_url: Option<&Url>) -> String {
    let mut result = md.replace("\r\n", "\n");

    result = collapse_blank_lines(&result);
    result = fix_code_fence_languages(&result);
    result = absolutize_links(&result, base_url);
    result = trim_line_ends(&result);
    result = ensure_trailing_newline(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: blank lines
// ---------------------------------------------------------------------------

/// Collapse runs of 3+ blank lines into exactly 2.
fn collapse_blank_lines(md: &str) -> String {
    static MULTI_BLANK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{4,}").expect("valid regex"));

    MULTI_BLANK_RE.replace_all(md, "\n\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 2: code fence languages
// ---------------------------------------------------------------------------

/// Turn class-style fence hints (`language-js`, `lang-python`, `prism-go`) into bare names.
fn fix_code_fence_languages(md: &str) -> String {
    static LANG_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^(\s*)```(?:language-|lang-|prism-|highlight-)([\w+#-]+)")
            .expect("valid regex")
    });

    LANG_PREFIX_RE.replace_all(md, "$1```$2").into_owned()
}

// ---------------------------------------------------------------------------
// Pass 3: links
// ---------------------------------------------------------------------------

/// Resolve site-relative Markdown links against the page URL.
///
/// Images, anchors, `mailto:` and already-absolute links are kept verbatim,
/// as is everything inside fenced code blocks.
fn absolutize_links(md: &str, base_url: Option<&Url>) -> String {
    static LINK_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

    let Some(base) = base_url else {
        return md.to_string();
    };

    map_outside_fences(md, |line| {
        LINK_RE
            .replace_all(line, |caps: &Captures| {
                let (bang, text, href) = (&caps[1], &caps[2], &caps[3]);
                if !bang.is_empty() || is_absolute_or_local(href) {
                    return caps[0].to_string();
                }
                match base.join(href) {
                    Ok(resolved) => format!("[{text}]({resolved})"),
                    Err(_) => caps[0].to_string(),
                }
            })
            .into_owned()
    })
}

/// Apply `f` to each line outside fenced code blocks; fence lines and code pass through.
fn map_outside_fences(md: &str, f: impl Fn(&str) -> String) -> String {
    let mut in_code_block = false;
    let mut lines = Vec::new();

    for line in md.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
        } else if in_code_block {
            lines.push(line.to_string());
        } else {
            lines.push(f(line));
        }
    }

    lines.join("\n")
}

fn is_absolute_or_local(href: &str) -> bool {
    href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("http://")
        || href.starts_with("https://")
}

// ---------------------------------------------------------------------------
// Pass 4: whitespace
// ---------------------------------------------------------------------------

fn trim_line_ends(md: &str) -> String {
    md.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

/// Ensure the text ends with exactly one newline (empty text stays empty).
fn ensure_trailing_newline(md: &str) -> String {
    let trimmed = md.trim_end_matches('\n');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{trimmed}\n")
}
