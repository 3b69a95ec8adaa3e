// src/transform/css.rs

use anyhow::{anyhow, Result};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::config::model::{parse_browser_version, BrowserTargets};

use super::{Asset, Transform};

/// Adds vendor prefixes for the configured browsers, then minifies.
#[derive(Debug, Clone, Default)]
pub struct CssOptimizer {
    browsers: Browsers,
}

impl CssOptimizer {
    pub fn new(targets: &BrowserTargets) -> Self {
        let mut browsers = Browsers::default();
        for (name, version) in targets.entries() {
            let v = parse_browser_version(version);
            match name {
                "android" => browsers.android = v,
                "chrome" => browsers.chrome = v,
                "edge" => browsers.edge = v,
                "firefox" => browsers.firefox = v,
                "ie" => browsers.ie = v,
                "ios_saf" => browsers.ios_saf = v,
                "opera" => browsers.opera = v,
                "safari" => browsers.safari = v,
                "samsung" => browsers.samsung = v,
                _ => {}
            }
        }
        Self { browsers }
    }

    pub fn process(&self, filename: &str, code: &str) -> Result<String> {
        let targets = Targets::from(self.browsers.clone());

        let mut sheet = StyleSheet::parse(
            code,
            ParserOptions {
                filename: filename.to_string(),
                ..ParserOptions::default()
            },
        )
        .map_err(|e| anyhow!("parsing {filename}: {e}"))?;

        sheet
            .minify(MinifyOptions {
                targets: targets.clone(),
                ..MinifyOptions::default()
            })
            .map_err(|e| anyhow!("minifying {filename}: {e}"))?;

        let out = sheet
            .to_css(PrinterOptions {
                minify: true,
                targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| anyhow!("printing {filename}: {e}"))?;

        Ok(out.code)
    }
}

impl Transform for CssOptimizer {
    fn name(&self) -> &'static str {
        "css"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let filename = asset.rel.to_string_lossy().into_owned();
        let css = self.process(&filename, asset.text()?)?;
        Ok(Asset {
            contents: css.into_bytes(),
            ..asset
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_and_minifies() {
        let optimizer = CssOptimizer::new(&BrowserTargets::default());
        let out = optimizer
            .process(
                "app.css",
                "/* banner */\n.box {\n    user-select: none;\n    color: #ff0000;\n}\n",
            )
            .unwrap();

        assert!(out.contains("-webkit-user-select:none"), "{out}");
        assert!(out.contains("user-select:none"));
        assert!(!out.contains("banner"));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn output_is_stable_under_reprocessing() {
        let optimizer = CssOptimizer::new(&BrowserTargets::default());
        let once = optimizer.process("a.css", ".a { margin: 0px 0px; }").unwrap();
        let twice = optimizer.process("a.css", &once).unwrap();
        assert_eq!(once, twice);
    }
}
