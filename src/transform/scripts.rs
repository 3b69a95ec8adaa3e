// src/transform/scripts.rs

use anyhow::Result;

use super::{Asset, Transform};

/// Script minifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsMinifier;

impl Transform for JsMinifier {
    fn name(&self) -> &'static str {
        "js"
    }

    fn apply(&self, asset: Asset) -> Result<Asset> {
        let minified = minifier::js::minify(asset.text()?).to_string();
        Ok(Asset {
            contents: minified.into_bytes(),
            ..asset
        })
    }
}
