// src/tasks/images.rs

//! `buildImg`: optimize images into `images.dist`, through the image cache.

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::cache::cache_key;
use crate::source::is_up_to_date;
use crate::transform::ImageOptimizer;

use super::{TaskContext, TaskReport};

pub fn build_img(ctx: &TaskContext) -> Result<TaskReport> {
    let paths = &ctx.config.paths;
    let fs = ctx.fs.as_ref();
    let files = ctx.source_set(&paths.images.sources)?.resolve(fs)?;

    let optimizer = ImageOptimizer::new(ctx.config.images.clone());
    let fingerprint = optimizer.fingerprint();
    let out_dir = ctx.path(&paths.images.dist);
    let mut report = TaskReport::default();

    for file in files {
        let dest = out_dir.join(&file.rel);
        if is_up_to_date(fs, fs.modified(&file.path), &dest) {
            trace!(image = %file.rel.display(), "image up to date");
            report.skipped += 1;
            continue;
        }

        let input = fs.read(&file.path)?;
        let key = cache_key(&file.rel, &input, &fingerprint);

        let cached = ctx.cache().get(&key)?;
        let output = match cached {
            Some(bytes) => {
                debug!(image = %file.rel.display(), "image cache hit");
                report.cache_hits += 1;
                bytes
            }
            None => {
                let bytes = optimizer
                    .optimize(&file.rel, &input)
                    .with_context(|| format!("optimizing {}", file.path.display()))?;
                ctx.cache().put(&key, &bytes)?;
                bytes
            }
        };

        fs.write(&dest, &output)?;
        report.written += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::config::{ConfigFile, RawConfigFile};
    use crate::fs::FileSystem;
    use crate::fs::mock::MockFileSystem;
    use crate::types::CacheStorageMode;

    const SVG: &str = "<svg width=\"4\" height=\"4\">\n  <!-- c -->\n  <g>\n    <rect/>\n  </g>\n</svg>\n";

    #[test]
    fn second_run_after_deleting_outputs_is_served_from_cache() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/proj/src/media/img/icons/a.svg", SVG);
        fs.add_file("/proj/src/media/img/b.gif", "GIF89a");

        let mut raw = RawConfigFile::default();
        raw.config.cache_storage = CacheStorageMode::Memory;
        let config = ConfigFile::try_from(raw).unwrap();
        let ctx = TaskContext::new("/proj", config, fs.clone());

        let first = build_img(&ctx).unwrap();
        assert_eq!((first.written, first.cache_hits), (2, 0));
        let svg_out = fs.read(Path::new("/proj/dist/media/img/icons/a.svg")).unwrap();
        assert_eq!(svg_out, b"<svg width=\"4\" height=\"4\"><rect/></svg>");

        fs.remove_dir_all(Path::new("/proj/dist")).unwrap();
        let second = build_img(&ctx).unwrap();
        assert_eq!((second.written, second.cache_hits), (2, 2));
        assert_eq!(
            fs.read(Path::new("/proj/dist/media/img/icons/a.svg")).unwrap(),
            svg_out
        );
    }

    #[test]
    fn up_to_date_outputs_are_skipped() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/proj/src/media/img/logo.svg", SVG);
        let ctx = TaskContext::new("/proj", ConfigFile::default(), fs.clone());

        build_img(&ctx).unwrap();
        let again = build_img(&ctx).unwrap();
        assert_eq!((again.written, again.skipped), (0, 1));
    }
}
