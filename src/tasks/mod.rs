// src/tasks/mod.rs

//! Named pipeline tasks.
//!
//! Every task reads from source sets in the path registry and writes into
//! exactly one destination. File-bound tasks are plain synchronous functions
//! over a [`TaskContext`]; [`run_task`] moves them onto the blocking pool.
//! `browserSync` and `watchFiles` are long-running and live in
//! [`crate::server`] and [`crate::watch`].

pub mod bundle;
pub mod clean;
pub mod copy;
pub mod images;
pub mod styles;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::cache::{CacheStore, open_store};
use crate::config::ConfigFile;
use crate::config::registry::{PathRegistry, resolve};
use crate::errors::{AssetdagError, Result};
use crate::fs::FileSystem;
use crate::server::LiveReload;
use crate::source::SourceSet;

/// Every task the orchestrator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskName {
    BuildScss,
    BuildCss,
    BuildJs,
    BuildImg,
    Favicon,
    Minify,
    Clean,
    BrowserSync,
    WatchFiles,
}

impl TaskName {
    pub const ALL: [TaskName; 9] = [
        TaskName::BuildScss,
        TaskName::BuildCss,
        TaskName::BuildJs,
        TaskName::BuildImg,
        TaskName::Favicon,
        TaskName::Minify,
        TaskName::Clean,
        TaskName::BrowserSync,
        TaskName::WatchFiles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskName::BuildScss => "buildScss",
            TaskName::BuildCss => "buildCss",
            TaskName::BuildJs => "buildJs",
            TaskName::BuildImg => "buildImg",
            TaskName::Favicon => "favicon",
            TaskName::Minify => "minify",
            TaskName::Clean => "clean",
            TaskName::BrowserSync => "browserSync",
            TaskName::WatchFiles => "watchFiles",
        }
    }

    /// What happens to per-file failures.
    pub fn error_policy(self) -> ErrorPolicy {
        match self {
            TaskName::BuildScss | TaskName::BuildJs => ErrorPolicy::Report,
            _ => ErrorPolicy::Propagate,
        }
    }

    /// Runs until shutdown rather than to completion.
    pub fn is_long_running(self) -> bool {
        matches!(self, TaskName::BrowserSync | TaskName::WatchFiles)
    }

    /// Destinations this task writes, resolved against `root`.
    pub fn outputs(self, root: &Path, paths: &PathRegistry) -> Vec<Output> {
        let dir = |rel: &str| vec![Output::Dir(resolve(root, rel))];
        match self {
            TaskName::BuildScss => dir(&paths.css.app),
            TaskName::BuildCss => dir(&paths.css.frame),
            TaskName::BuildJs => dir(&paths.scripts.lib),
            TaskName::BuildImg => dir(&paths.images.dist),
            TaskName::Minify => dir(&paths.markup.dist),
            TaskName::Clean => dir(&paths.dist_root),
            TaskName::Favicon => vec![Output::File(root.join(paths.favicon_target()))],
            TaskName::BrowserSync | TaskName::WatchFiles => Vec::new(),
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path a task writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Dir(PathBuf),
    File(PathBuf),
}

impl Output {
    pub fn path(&self) -> &Path {
        match self {
            Output::Dir(p) | Output::File(p) => p,
        }
    }

    /// True if writing to `self` may touch files written to `other`.
    pub fn overlaps(&self, other: &Output) -> bool {
        self.path().starts_with(other.path()) || other.path().starts_with(self.path())
    }
}

/// How a task treats a failure on a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// The first failure fails the task.
    Propagate,
    /// Failures are logged and collected in the [`TaskReport`]; the task
    /// carries on with the remaining files and succeeds.
    Report,
}

/// Counters for one task run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    pub written: usize,
    pub skipped: usize,
    pub cache_hits: usize,
    /// `"<path>: <error>"` for every reported failure.
    pub failures: Vec<String>,
}

impl TaskReport {
    pub fn record_failure(&mut self, path: &Path, err: &anyhow::Error) {
        warn!(file = %path.display(), error = %format!("{err:#}"), "file failed; continuing");
        self.failures.push(format!("{}: {err:#}", path.display()));
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Shared state handed to every task.
pub struct TaskContext {
    pub root: PathBuf,
    pub config: ConfigFile,
    pub fs: Arc<dyn FileSystem>,
    pub reload: LiveReload,
    cache: Mutex<Box<dyn CacheStore>>,
    shutdown: watch::Sender<bool>,
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("root", &self.root)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl TaskContext {
    /// Build a context with the cache selected by `[config].cache_storage`
    /// and a fresh [`LiveReload`] handle.
    pub fn new(root: impl Into<PathBuf>, config: ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        let root = root.into();
        let cache = open_store(config.config.cache_storage, &root, fs.clone());
        let (shutdown, _) = watch::channel(false);
        Self {
            root,
            config,
            fs,
            reload: LiveReload::new(),
            cache: Mutex::new(cache),
            shutdown,
        }
    }

    /// Resolve a registry path against the project root.
    pub fn path(&self, rel: &str) -> PathBuf {
        resolve(&self.root, rel)
    }

    pub fn source_set(&self, pattern: &str) -> Result<SourceSet> {
        SourceSet::new(&self.root, pattern)
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, Box<dyn CacheStore>> {
        // A panic while holding the lock leaves the store usable.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask long-running tasks to stop.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolves once [`request_shutdown`](Self::request_shutdown) was called.
    pub async fn shutdown_requested(&self) {
        wait_for_shutdown(self.shutdown.subscribe()).await;
    }

    /// Receiver for components that outlive a borrow of the context.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Resolves once the shutdown flag is set or its sender is gone.
pub async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

/// Run one task to completion.
pub async fn run_task(ctx: Arc<TaskContext>, task: TaskName) -> Result<TaskReport> {
    info!(%task, "task started");

    let result = match task {
        TaskName::BuildScss => blocking(&ctx, styles::build_scss).await,
        TaskName::BuildCss => blocking(&ctx, copy::build_css).await,
        TaskName::BuildJs => blocking(&ctx, copy::build_js).await,
        TaskName::BuildImg => blocking(&ctx, images::build_img).await,
        TaskName::Favicon => blocking(&ctx, copy::favicon).await,
        TaskName::Minify => blocking(&ctx, bundle::minify).await,
        TaskName::Clean => blocking(&ctx, clean::clean).await,
        TaskName::BrowserSync => crate::server::browser_sync(ctx.clone())
            .await
            .map(|()| TaskReport::default()),
        TaskName::WatchFiles => crate::watch::watch_files(ctx.clone())
            .await
            .map(|()| TaskReport::default()),
    };

    match result {
        Ok(report) => {
            info!(
                %task,
                written = report.written,
                skipped = report.skipped,
                cache_hits = report.cache_hits,
                failures = report.failures.len(),
                "task finished"
            );
            Ok(report)
        }
        Err(source) => {
            error!(%task, error = %format!("{source:#}"), "task failed");
            Err(AssetdagError::TaskFailed { task, source })
        }
    }
}

async fn blocking(
    ctx: &Arc<TaskContext>,
    f: fn(&TaskContext) -> anyhow::Result<TaskReport>,
) -> anyhow::Result<TaskReport> {
    let ctx = Arc::clone(ctx);
    tokio::task::spawn_blocking(move || f(&ctx))
        .await
        .map_err(|e| anyhow!("task panicked or was cancelled: {e}"))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_outputs_of_build_do_not_overlap() {
        let paths = PathRegistry::default();
        let root = Path::new("/proj");
        let img = TaskName::BuildImg.outputs(root, &paths);
        let fav = TaskName::Favicon.outputs(root, &paths);
        assert!(!img[0].overlaps(&fav[0]));

        let clean = TaskName::Clean.outputs(root, &paths);
        assert!(clean[0].overlaps(&img[0]));
    }

    #[test]
    fn report_policy_only_for_styles_and_vendor_scripts() {
        let report: Vec<_> = TaskName::ALL
            .into_iter()
            .filter(|t| t.error_policy() == ErrorPolicy::Report)
            .collect();
        assert_eq!(report, vec![TaskName::BuildScss, TaskName::BuildJs]);
    }
}
