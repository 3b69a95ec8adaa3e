// src/transform/markup.rs

//! HTML minification.
//!
//! Conservative: comments are dropped (except conditional comments) and
//! whitespace runs collapse to one space. Whitespace between two tags is
//! removed only when one of them is a block-level element; between inline
//! elements (`<a>`, `<b>`, `<span>`, ...) it renders, so one space stays.
//! Content of `<pre>`, `<textarea>`, `<script>` and `<style>` is left
//! untouched.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;

use super::{Asset, Transform};

static PRESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<pre\b.*?</pre\s*>|<textarea\b.*?</textarea\s*>|<script\b.*?</script\s*>|<style\b.*?</style\s*>",
    )
    .expect("static regex")
});
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static BETWEEN_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s+<").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlMinifier;

impl HtmlMinifier {
    pub fn minify(&self, html: &str) -> String {
        let mut out = String::with_capacity(html.len());
        let mut last = 0;

        for m in PRESERVED.find_iter(html) {
            let raw = trim_line_break_edges(&html[last..m.start()], last > 0, true);
            out.push_str(&minify_segment(raw));
            out.push_str(m.as_str());
            last = m.end();
        }
        let tail = trim_line_break_edges(&html[last..], last > 0, false);
        out.push_str(&minify_segment(tail));

        out.trim().to_string()
    }
}

fn minify_segment(segment: &str) -> String {
    let without_comments = COMMENT.replace_all(segment, |caps: &regex::Captures<'_>| {
        let c = &caps[0];
        if c.starts_with("<!--[if") || c.starts_with("<!--<![") {
            c.to_string()
        } else {
            String::new()
        }
    });
    let joined = collapse_between_tags(&without_comments, |before, after| {
        !is_block(before) && !is_block(after)
    });
    WHITESPACE.replace_all(&joined, " ").into_owned()
}

/// Elements whose surrounding whitespace never renders.
fn is_block(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "!doctype" | "html" | "head" | "body" | "title" | "meta" | "link" | "base" | "script"
            | "style" | "noscript" | "div" | "p" | "ul" | "ol" | "li" | "dl" | "dt" | "dd"
            | "table" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th" | "caption" | "colgroup"
            | "col" | "section" | "article" | "header" | "footer" | "nav" | "main" | "aside"
            | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hr" | "br" | "form" | "fieldset"
            | "legend" | "figure" | "figcaption" | "blockquote" | "pre" | "address" | "option"
            | "optgroup" | "template"
    )
}

/// Rewrite whitespace-only runs between two tags: one space when
/// `keep_space(previous_tag, next_tag)` holds, nothing otherwise.
pub(crate) fn collapse_between_tags(text: &str, keep_space: impl Fn(&str, &str) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in BETWEEN_TAGS.find_iter(text) {
        // Up to and including the closing `>` of the previous tag.
        out.push_str(&text[last..=m.start()]);
        let before = text[..m.start()]
            .rfind('<')
            .map_or("", |i| tag_name(&text[i + 1..]));
        let after = tag_name(&text[m.end()..]);
        if keep_space(before, after) {
            out.push(' ');
        }
        out.push('<');
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Element name at the start of a tag body (`/a href=..` → `a`).
fn tag_name(tag: &str) -> &str {
    let tag = tag.strip_prefix('/').unwrap_or(tag);
    let end = tag
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '!')))
        .unwrap_or(tag.len());
    &tag[..end]
}

/// Drop whitespace that separates a segment from an adjacent preserved
/// block, provided it spans a line break and the other side is a tag.
fn trim_line_break_edges(raw: &str, after_block: bool, before_block: bool) -> &str {
    let mut s = raw;
    if after_block {
        let trimmed = s.trim_start();
        let edge = &s[..s.len() - trimmed.len()];
        if edge.contains('\n') && (trimmed.is_empty() || trimmed.starts_with('<')) {
            s = trimmed;
        }
    }
    if before_block {
        let trimmed = s.trim_end();
        let edge = &s[trimmed.len()..];
        if edge.contains('\n') && (trimmed.is_empty() || trimmed.ends_with('>')) {
            s = trimmed;
        }
    }
    s
}

impl Transform for HtmlMinifier {
    fn name(&self) -> &'static str {
        "html"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let html = self.minify(asset.text()?);
        Ok(Asset {
            contents: html.into_bytes(),
            ..asset
        })
    }
}
