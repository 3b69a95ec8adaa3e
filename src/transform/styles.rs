// src/transform/styles.rs

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::config::StyleOutput;

use super::{with_extension, Asset, Transform};

/// SCSS → CSS compiler.
///
/// The directory of the asset's origin is always searched first for
/// `@use` / `@import`, followed by the configured load paths.
#[derive(Debug, Clone)]
pub struct ScssCompiler {
    style: StyleOutput,
    load_paths: Vec<PathBuf>,
}

impl ScssCompiler {
    pub fn new(style: StyleOutput, load_paths: Vec<PathBuf>) -> Self {
        Self { style, load_paths }
    }

    pub fn compile(&self, source: &str, origin: Option<&std::path::Path>) -> Result<String> {
        let style = match self.style {
            StyleOutput::Expanded => grass::OutputStyle::Expanded,
            StyleOutput::Compressed => grass::OutputStyle::Compressed,
        };

        let mut options = grass::Options::default().style(style);
        if let Some(dir) = origin.and_then(|o| o.parent()) {
            options = options.load_path(dir);
        }
        for path in &self.load_paths {
            options = options.load_path(path);
        }

        grass::from_string(source.to_string(), &options).map_err(|e| anyhow!("{e}"))
    }
}

impl Transform for ScssCompiler {
    fn name(&self) -> &'static str {
        "scss"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let css = self.compile(asset.text()?, asset.origin.as_deref())?;
        Ok(Asset {
            rel: with_extension(&asset.rel, "css"),
            contents: css.into_bytes(),
            origin: asset.origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_nested_rules_in_expanded_style() {
        let compiler = ScssCompiler::new(StyleOutput::Expanded, Vec::new());
        let out = compiler
            .apply(Asset::new("app/main.scss", "$c: red;\n.a { .b { color: $c; } }\n"))
            .unwrap();

        assert_eq!(out.rel, PathBuf::from("app/main.css"));
        let css = String::from_utf8(out.contents).unwrap();
        assert!(css.contains(".a .b {"));
        assert!(css.contains("color: red;"));
        assert!(css.contains('\n'));
    }

    #[test]
    fn malformed_source_is_an_error() {
        let compiler = ScssCompiler::new(StyleOutput::Expanded, Vec::new());
        assert!(compiler.apply(Asset::new("bad.scss", ".a { color: red;")).is_err());
    }
}
