// src/transform/mod.rs

//! Content transforms applied by tasks.
//!
//! Every transform takes an [`Asset`] and returns a new one; a [`Pipeline`]
//! chains them, optionally gated on a file-name glob (so one pipeline can
//! minify `*.js` and prefix `*.css` in the same pass).
//!
//! - [`styles`]: SCSS compilation.
//! - [`css`]: vendor prefixing and minification.
//! - [`scripts`]: script minification.
//! - [`markup`]: HTML minification.
//! - [`images`]: per-format image optimizers.
//! - [`useref`]: build-block parsing for the markup bundler.

pub mod css;
pub mod images;
pub mod markup;
pub mod scripts;
pub mod styles;
pub mod useref;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use tracing::trace;

pub use css::CssOptimizer;
pub use images::ImageOptimizer;
pub use markup::HtmlMinifier;
pub use scripts::JsMinifier;
pub use styles::ScssCompiler;

/// A file in flight through a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Output path relative to the destination directory.
    pub rel: PathBuf,
    pub contents: Vec<u8>,
    /// Where the asset was read from, if it came from disk.
    pub origin: Option<PathBuf>,
}

impl Asset {
    pub fn new(rel: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            rel: rel.into(),
            contents: contents.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.contents)
            .with_context(|| format!("{} is not valid UTF-8", self.rel.display()))
    }

    fn file_name(&self) -> String {
        self.rel
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A single content transform.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, asset: Asset) -> Result<Asset>;
}

struct Step {
    only: GlobMatcher,
    transform: Box<dyn Transform>,
}

/// Linear chain of file-name gated transforms.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.steps.iter().map(|s| s.transform.name()).collect();
        f.debug_struct("Pipeline").field("steps", &names).finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transform applied to assets whose file name matches
    /// `pattern` (e.g. `"*.js"`).
    pub fn when(mut self, pattern: &str, transform: impl Transform + 'static) -> Result<Self> {
        let glob = Glob::new(pattern)
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();
        self.steps.push(Step {
            only: glob,
            transform: Box::new(transform),
        });
        Ok(self)
    }

    pub fn run(&self, mut asset: Asset) -> Result<Asset> {
        for step in &self.steps {
            if !step.only.is_match(asset.file_name()) {
                continue;
            }
            trace!(transform = step.transform.name(), asset = ?asset.rel, "applying transform");
            let rel = asset.rel.clone();
            asset = step
                .transform
                .apply(asset)
                .with_context(|| format!("{} failed on {}", step.transform.name(), rel.display()))?;
        }
        Ok(asset)
    }
}

/// Replace the extension of a relative path.
pub(crate) fn with_extension(rel: &Path, ext: &str) -> PathBuf {
    rel.with_extension(ext)
}
