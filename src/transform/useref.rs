// src/transform/useref.rs

//! Build blocks in markup.
//!
//! A build block is a pair of HTML comments around asset references:
//!
//! ```html
//! <!-- build:js(vendor,lib) js/app.min.js -->
//! <script src="js/a.js"></script>
//! <script src="js/b.js"></script>
//! <!-- endbuild -->
//! ```
//!
//! The bundler concatenates the referenced files into the target and replaces
//! the whole block with a single tag pointing at it.

use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Result, anyhow, bail};
use regex::Regex;

use crate::fs::FileSystem;

static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*build:([A-Za-z]+)(?:\(([^)]*)\))?(?:\s+([^\s]+?))?\s*-->")
        .expect("static regex")
});
static BLOCK_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*endbuild\s*-->").expect("static regex"));
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<(?:link|script)\b[^>]*?\s(?:href|src)\s*=\s*["']([^"']+)["']"#)
        .expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Css,
    Js,
    Remove,
}

/// One parsed build block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildBlock {
    pub kind: BlockKind,
    /// Extra directories tried after the markup file's own directory.
    pub search_paths: Vec<String>,
    /// Output path relative to the markup file. `None` for `remove` blocks.
    pub target: Option<String>,
    /// Referenced asset URLs, in document order.
    pub references: Vec<String>,
    /// Byte range of the block (start comment to end comment inclusive).
    pub span: Range<usize>,
}

impl BuildBlock {
    /// The tag that replaces this block in the output markup.
    pub fn replacement(&self) -> String {
        match (self.kind, &self.target) {
            (BlockKind::Css, Some(target)) => format!(r#"<link rel="stylesheet" href="{target}">"#),
            (BlockKind::Js, Some(target)) => format!(r#"<script src="{target}"></script>"#),
            _ => String::new(),
        }
    }
}

/// Find every build block in `html`.
pub fn parse_blocks(html: &str) -> Result<Vec<BuildBlock>> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(start) = BLOCK_START.captures_at(html, pos) {
        let Some(whole) = start.get(0) else { break };
        let kind = match &start[1] {
            "css" => BlockKind::Css,
            "js" => BlockKind::Js,
            "remove" => BlockKind::Remove,
            other => bail!("unknown build block type '{other}'"),
        };

        let end = BLOCK_END
            .find_at(html, whole.end())
            .ok_or_else(|| anyhow!("build:{} block without <!-- endbuild -->", &start[1]))?;

        let target = start.get(3).map(|m| m.as_str().to_string());
        if kind != BlockKind::Remove && target.is_none() {
            bail!("build:{} block without a target path", &start[1]);
        }

        let search_paths = start
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let references = REFERENCE
            .captures_iter(&html[whole.end()..end.start()])
            .map(|c| c[1].to_string())
            .collect();

        blocks.push(BuildBlock {
            kind,
            search_paths,
            target,
            references,
            span: whole.start()..end.end(),
        });
        pos = end.end();
    }

    Ok(blocks)
}

/// Replace every block with its [`BuildBlock::replacement`].
pub fn replace_blocks(html: &str, blocks: &[BuildBlock]) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for block in blocks {
        out.push_str(&html[last..block.span.start]);
        out.push_str(&block.replacement());
        last = block.span.end;
    }
    out.push_str(&html[last..]);
    out
}

/// Locate the file behind an asset reference.
///
/// References starting with `/` resolve against `markup_base`. Others are
/// tried relative to `markup_dir`, then relative to each search path (which
/// are themselves relative to `markup_dir`). Query strings and fragments are
/// ignored.
pub fn resolve_reference(
    fs: &dyn FileSystem,
    reference: &str,
    markup_dir: &Path,
    markup_base: &Path,
    search_paths: &[String],
) -> Result<PathBuf> {
    let clean = reference.split(['?', '#']).next().unwrap_or(reference);

    if let Some(absolute) = clean.strip_prefix('/') {
        let path = normalize(&markup_base.join(absolute));
        if fs.is_file(&path) {
            return Ok(path);
        }
        bail!("referenced asset '{reference}' not found at {}", path.display());
    }

    let candidates = std::iter::once(markup_dir.join(clean))
        .chain(search_paths.iter().map(|dir| markup_dir.join(dir).join(clean)))
        .map(|p| normalize(&p));

    let mut tried = Vec::new();
    for candidate in candidates {
        if fs.is_file(&candidate) {
            return Ok(candidate);
        }
        tried.push(candidate.display().to_string());
    }
    bail!("referenced asset '{reference}' not found (tried {})", tried.join(", "))
}

/// Fold `.` and `..` components without touching the filesystem.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
