// src/tasks/bundle.rs

//! `minify`: resolve build blocks, write the bundles and the rewritten
//! markup into `markup.dist`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::transform::useref::{BlockKind, normalize, parse_blocks, replace_blocks, resolve_reference};
use crate::transform::{Asset, CssOptimizer, HtmlMinifier, JsMinifier, Pipeline};

use super::{TaskContext, TaskReport};

/// A bundle and the markup file that produced it.
struct Bundle {
    contents: Vec<u8>,
    producer: PathBuf,
}

pub fn minify(ctx: &TaskContext) -> Result<TaskReport> {
    let paths = &ctx.config.paths;
    let fs = ctx.fs.as_ref();
    let set = ctx.source_set(&paths.markup.sources)?;
    let markup_base = set.base_dir();
    let out_dir = ctx.path(&paths.markup.dist);

    let bundlers = Pipeline::new()
        .when("*.js", JsMinifier)?
        .when("*.css", CssOptimizer::new(&ctx.config.bundle.targets))?;
    let minify_html = ctx.config.bundle.minify_html;

    let mut bundles: BTreeMap<PathBuf, Bundle> = BTreeMap::new();
    let mut report = TaskReport::default();

    for file in set.resolve(fs)? {
        let source = fs.read_to_string(&file.path)?;
        let blocks = parse_blocks(&source).with_context(|| format!("in {}", file.path.display()))?;
        let markup_dir = file.path.parent().unwrap_or(&markup_base);
        let out_rel_dir = file.rel.parent().unwrap_or(Path::new(""));

        for block in &blocks {
            let (BlockKind::Css | BlockKind::Js, Some(target)) = (block.kind, &block.target) else {
                continue;
            };

            let mut joined = String::new();
            for (i, reference) in block.references.iter().enumerate() {
                let path = resolve_reference(fs, reference, markup_dir, &markup_base, &block.search_paths)
                    .with_context(|| format!("in {}", file.path.display()))?;
                if i > 0 {
                    joined.push('\n');
                }
                joined.push_str(&fs.read_to_string(&path)?);
            }

            let target_rel = match target.strip_prefix('/') {
                Some(from_base) => normalize(Path::new(from_base)),
                None => normalize(&out_rel_dir.join(target)),
            };
            let bundle = bundlers.run(Asset::new(target_rel.clone(), joined))?;
            debug!(
                target = %target_rel.display(),
                files = block.references.len(),
                bytes = bundle.contents.len(),
                "bundled"
            );

            if let Some(previous) = bundles.get(&target_rel) {
                if previous.contents != bundle.contents {
                    warn!(
                        target = %target_rel.display(),
                        first = %previous.producer.display(),
                        later = %file.rel.display(),
                        "bundle target produced twice with different content; keeping the later one"
                    );
                }
            }
            bundles.insert(
                target_rel,
                Bundle {
                    contents: bundle.contents,
                    producer: file.rel.clone(),
                },
            );
        }

        let mut html = replace_blocks(&source, &blocks);
        if minify_html {
            html = HtmlMinifier.minify(&html);
        }
        fs.write(&out_dir.join(&file.rel), html.as_bytes())?;
        report.written += 1;
    }

    for (rel, bundle) in bundles {
        fs.write(&out_dir.join(rel), &bundle.contents)?;
        report.written += 1;
    }

    Ok(report)
}
