// src/tasks/styles.rs

//! `buildScss`: compile style units into `css.app`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::source::{SourceFile, is_up_to_date, newest_mtime};
use crate::transform::{Asset, ScssCompiler, Transform};

use super::{TaskContext, TaskReport};

/// Partials (`_name.scss`) are only ever imported.
fn is_partial(rel: &Path) -> bool {
    rel.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('_'))
}

pub fn build_scss(ctx: &TaskContext) -> Result<TaskReport> {
    let paths = &ctx.config.paths;
    let fs = ctx.fs.as_ref();
    let set = ctx.source_set(&paths.styles.sources)?;

    let (partials, units): (Vec<SourceFile>, Vec<SourceFile>) = set
        .resolve(fs)?
        .into_iter()
        .partition(|f| is_partial(&f.rel));

    let mut load_paths = vec![set.base_dir()];
    load_paths.extend(ctx.config.styles.load_paths.iter().map(|p| ctx.path(p)));
    let compiler = ScssCompiler::new(ctx.config.styles.output_style, load_paths);

    let out_dir = ctx.path(&paths.css.app);
    let mut report = TaskReport::default();

    for unit in &units {
        let asset = Asset::new(unit.rel.clone(), Vec::new()).with_origin(&unit.path);
        let dest: PathBuf = out_dir.join(unit.rel.with_extension("css"));

        // A newer partial invalidates every unit.
        let inputs = std::iter::once(unit.path.as_path()).chain(partials.iter().map(|p| p.path.as_path()));
        if is_up_to_date(fs, newest_mtime(fs, inputs), &dest) {
            debug!(unit = %unit.rel.display(), "style unit up to date");
            report.skipped += 1;
            continue;
        }

        let compiled = fs
            .read(&unit.path)
            .map(|contents| Asset { contents, ..asset })
            .and_then(|asset| compiler.apply(asset));

        match compiled {
            Ok(css) => {
                fs.write(&dest, &css.contents)?;
                report.written += 1;
            }
            Err(err) => report.record_failure(&unit.path, &err),
        }
    }

    if report.written > 0 {
        ctx.reload.reload_css();
    }
    Ok(report)
}
