// src/tasks/clean.rs

use anyhow::Result;
use tracing::{debug, info};

use super::{TaskContext, TaskReport};

/// Delete the distribution root. An absent tree is not an error.
pub fn clean(ctx: &TaskContext) -> Result<TaskReport> {
    let dist = ctx.path(&ctx.config.paths.dist_root);
    if ctx.fs.remove_dir_all(&dist)? {
        info!(dir = %dist.display(), "removed distribution root");
    } else {
        debug!(dir = %dist.display(), "distribution root already absent");
    }
    Ok(TaskReport::default())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use super::*;
    use crate::config::ConfigFile;
    use crate::fs::FileSystem;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn clean_twice_succeeds() {
        let fs = Arc::new(MockFileSystem::new());
        fs.add_file("/proj/dist/stale.html", "old");
        fs.add_file("/proj/src/index.html", "keep");
        let ctx = TaskContext::new("/proj", ConfigFile::default(), fs.clone());

        clean(&ctx).unwrap();
        clean(&ctx).unwrap();

        assert!(!fs.exists(Path::new("/proj/dist/stale.html")));
        assert!(fs.exists(Path::new("/proj/src/index.html")));
    }
}
