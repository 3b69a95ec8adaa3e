// src/tasks/copy.rs

//! Verbatim copies: `buildCss`, `buildJs` and `favicon`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::source::{SourceFile, SourceSet, is_up_to_date};

use super::{ErrorPolicy, TaskContext, TaskName, TaskReport};

/// Copy the framework stylesheet into `css.frame`.
pub fn build_css(ctx: &TaskContext) -> Result<TaskReport> {
    let paths = &ctx.config.paths;
    let sources = vec![ctx.source_set(&paths.css.framework)?];
    copy_newer(ctx, &sources, &ctx.path(&paths.css.frame), TaskName::BuildCss.error_policy())
}

/// Copy the vendor scripts into `scripts.lib`.
pub fn build_js(ctx: &TaskContext) -> Result<TaskReport> {
    let paths = &ctx.config.paths;
    let sources = paths
        .scripts
        .vendor
        .iter()
        .map(|p| ctx.source_set(p))
        .collect::<crate::errors::Result<Vec<_>>>()?;
    copy_newer(ctx, &sources, &ctx.path(&paths.scripts.lib), TaskName::BuildJs.error_policy())
}

/// Copy the favicon. Always writes.
pub fn favicon(ctx: &TaskContext) -> Result<TaskReport> {
    let paths = &ctx.config.paths;
    let source = ctx.source_set(&paths.favicon.source)?;
    let file = source
        .resolve(ctx.fs.as_ref())?
        .into_iter()
        .next()
        .with_context(|| format!("favicon {} not found", paths.favicon.source))?;

    let dest = ctx.root.join(paths.favicon_target());
    let bytes = ctx.fs.read(&file.path)?;
    ctx.fs.write(&dest, &bytes)?;
    debug!(from = %file.path.display(), to = %dest.display(), "favicon copied");

    Ok(TaskReport {
        written: 1,
        ..TaskReport::default()
    })
}

/// Copy every file of `sources` into `dest_dir`, skipping files whose copy
/// is not older than the source.
fn copy_newer(
    ctx: &TaskContext,
    sources: &[SourceSet],
    dest_dir: &Path,
    policy: ErrorPolicy,
) -> Result<TaskReport> {
    let fs = ctx.fs.as_ref();
    let mut report = TaskReport::default();

    for set in sources {
        let files = match set.resolve(fs) {
            Ok(files) => files,
            Err(err) if policy == ErrorPolicy::Report => {
                report.record_failure(Path::new(set.pattern()), &err.into());
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        for file in files {
            match copy_one(ctx, &file, dest_dir) {
                Ok(true) => report.written += 1,
                Ok(false) => report.skipped += 1,
                Err(err) if policy == ErrorPolicy::Report => report.record_failure(&file.path, &err),
                Err(err) => return Err(err),
            }
        }
    }

    Ok(report)
}

/// Returns `false` when the copy was skipped.
fn copy_one(ctx: &TaskContext, file: &SourceFile, dest_dir: &Path) -> Result<bool> {
    let fs = ctx.fs.as_ref();
    let dest = dest_dir.join(&file.rel);
    if is_up_to_date(fs, fs.modified(&file.path), &dest) {
        debug!(file = %file.rel.display(), "destination not older; skipping");
        return Ok(false);
    }
    let bytes = fs.read(&file.path)?;
    fs.write(&dest, &bytes)
        .with_context(|| format!("copying {} to {}", file.path.display(), dest.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::ConfigFile;
    use crate::fs::FileSystem;
    use crate::fs::mock::MockFileSystem;

    fn context(fs: &Arc<MockFileSystem>) -> TaskContext {
        TaskContext::new("/proj", ConfigFile::default(), fs.clone())
    }

    #[test]
    fn framework_css_copies_then_skips_then_copies_again_when_source_is_newer() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/proj/node_modules/bootstrap/dist/css/bootstrap.min.css", "v1");
        let ctx = context(&fs);
        let dest = Path::new("/proj/src/css/framework/bootstrap.min.css");

        assert_eq!(build_css(&ctx).unwrap().written, 1);
        assert_eq!(fs.read(dest).unwrap(), b"v1");

        assert_eq!(build_css(&ctx).unwrap().skipped, 1);

        fs.add_file("/proj/node_modules/bootstrap/dist/css/bootstrap.min.css", "v2");
        assert_eq!(build_css(&ctx).unwrap().written, 1);
        assert_eq!(fs.read(dest).unwrap(), b"v2");
    }

    #[test]
    fn missing_framework_css_fails_the_task() {
        let fs = Arc::new(MockFileSystem::new());
        assert!(build_css(&context(&fs)).is_err());
    }

    #[test]
    fn missing_vendor_script_is_reported() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/proj/node_modules/jquery/dist/jquery.min.js", "jq");

        let report = build_js(&context(&fs)).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.failures.len(), 2);
        assert!(fs.exists(Path::new("/proj/src/js/lib/jquery.min.js")));
    }

    #[test]
    fn favicon_is_always_copied_and_required() {
        let fs = Arc::new(MockFileSystem::new());
        let ctx = context(&fs);
        assert!(favicon(&ctx).is_err());

        fs.add_file("/proj/src/favicon.ico", "ico");
        assert_eq!(favicon(&ctx).unwrap().written, 1);
        assert_eq!(favicon(&ctx).unwrap().written, 1);
        assert_eq!(fs.read(Path::new("/proj/dist/favicon.ico")).unwrap(), b"ico");
    }
}
