// src/flow/mod.rs

//! Workflow composition.
//!
//! A [`Flow`] is a tree of tasks combined in series or in parallel. Running a
//! flow is plain structured concurrency:
//!
//! - `Series` awaits its children in order and stops at the first failure.
//! - `Parallel` spawns every child on a [`JoinSet`], waits for all of them and
//!   then returns the first failure, if any.

pub mod graph;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::cli::Command;
use crate::errors::{AssetdagError, Result};
use crate::tasks::{TaskContext, TaskName, TaskReport, run_task};

pub use graph::FlowGraph;

/// Boxed future returned by [`TaskRunner::run`].
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<TaskReport>> + Send>>;

/// Runs a single task. Production code uses [`ContextRunner`]; tests swap in
/// runners that record calls or fail on demand.
pub trait TaskRunner: Send + Sync {
    fn run(&self, task: TaskName) -> TaskFuture;

    /// Ask running long-running tasks (server, watchers) to stop.
    fn request_stop(&self) {}
}

/// Runs tasks for real against a shared [`TaskContext`].
#[derive(Debug, Clone)]
pub struct ContextRunner {
    ctx: Arc<TaskContext>,
}

impl ContextRunner {
    pub fn new(ctx: Arc<TaskContext>) -> Self {
        Self { ctx }
    }
}

impl TaskRunner for ContextRunner {
    fn run(&self, task: TaskName) -> TaskFuture {
        Box::pin(run_task(self.ctx.clone(), task))
    }

    fn request_stop(&self) {
        self.ctx.request_shutdown();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Task(TaskName),
    Series(Vec<Flow>),
    Parallel(Vec<Flow>),
}

impl Flow {
    pub fn task(name: TaskName) -> Self {
        Flow::Task(name)
    }

    pub fn series(children: impl IntoIterator<Item = Flow>) -> Self {
        Flow::Series(children.into_iter().collect())
    }

    pub fn parallel(children: impl IntoIterator<Item = Flow>) -> Self {
        Flow::Parallel(children.into_iter().collect())
    }

    /// `clean`, then images and favicon side by side, then the markup bundle.
    pub fn build() -> Self {
        Flow::series([
            Flow::task(TaskName::Clean),
            Flow::parallel([Flow::task(TaskName::BuildImg), Flow::task(TaskName::Favicon)]),
            Flow::task(TaskName::Minify),
        ])
    }

    /// Initial compile, then file watchers and the dev server side by side.
    pub fn watch() -> Self {
        Flow::series([
            Flow::parallel([Flow::task(TaskName::BuildScss), Flow::task(TaskName::BuildJs)]),
            Flow::task(TaskName::BuildCss),
            Flow::parallel([Flow::task(TaskName::WatchFiles), Flow::task(TaskName::BrowserSync)]),
        ])
    }

    /// The flow behind a CLI entry point.
    pub fn for_command(command: Command) -> Self {
        match command {
            Command::BuildScss => Flow::task(TaskName::BuildScss),
            Command::BuildCss => Flow::task(TaskName::BuildCss),
            Command::BuildImg => Flow::task(TaskName::BuildImg),
            Command::BuildJs => Flow::task(TaskName::BuildJs),
            Command::Favicon => Flow::task(TaskName::Favicon),
            Command::Minify => Flow::task(TaskName::Minify),
            Command::Clean => Flow::task(TaskName::Clean),
            Command::BrowserSync => Flow::task(TaskName::BrowserSync),
            Command::Build => Flow::build(),
            Command::Watch => Flow::watch(),
        }
    }

    /// Every task in the flow, depth first.
    pub fn tasks(&self) -> Vec<TaskName> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks(&self, out: &mut Vec<TaskName>) {
        match self {
            Flow::Task(name) => out.push(*name),
            Flow::Series(children) | Flow::Parallel(children) => {
                children.iter().for_each(|c| c.collect_tasks(out))
            }
        }
    }

    /// Run the flow against real tasks.
    pub async fn run(&self, ctx: Arc<TaskContext>) -> Result<()> {
        self.run_with(Arc::new(ContextRunner::new(ctx))).await
    }

    /// Run the flow with a custom [`TaskRunner`].
    pub fn run_with(&self, runner: Arc<dyn TaskRunner>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        let flow = self.clone();
        Box::pin(async move {
            match flow {
                Flow::Task(name) => runner.run(name).await.map(|_| ()),
                Flow::Series(children) => {
                    for child in children {
                        child.run_with(runner.clone()).await?;
                    }
                    Ok(())
                }
                Flow::Parallel(children) => {
                    // A long-running sibling would otherwise keep the group
                    // (and the failure) pending until Ctrl-C.
                    let stop_on_failure = children
                        .iter()
                        .any(|c| c.tasks().iter().any(|t| t.is_long_running()));
                    let mut set = JoinSet::new();
                    for child in children {
                        set.spawn(child.run_with(runner.clone()));
                    }

                    let mut first_error = None;
                    while let Some(joined) = set.join_next().await {
                        let result = joined
                            .map_err(|e| AssetdagError::Other(anyhow!("parallel branch panicked: {e}")))
                            .and_then(|r| r);
                        if let Err(err) = result {
                            if first_error.is_none() && stop_on_failure {
                                error!(error = %err, "parallel branch failed; stopping long-running siblings");
                                runner.request_stop();
                            } else {
                                debug!(error = %err, "parallel branch failed");
                            }
                            first_error.get_or_insert(err);
                        }
                    }
                    first_error.map_or(Ok(()), Err)
                }
            }
        })
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, children) = match self {
            Flow::Task(name) => return write!(f, "{name}"),
            Flow::Series(children) => ("series", children),
            Flow::Parallel(children) => ("parallel", children),
        };
        write!(f, "{name}(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{child}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Records start/finish order; fails the tasks listed in `failing`.
    /// Long-running tasks block until `request_stop`.
    #[derive(Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
        failing: Vec<TaskName>,
        slow: Vec<TaskName>,
        stop: Arc<tokio::sync::Notify>,
    }

    impl TaskRunner for Recorder {
        fn run(&self, task: TaskName) -> TaskFuture {
            let log = self.log.clone();
            let fail = self.failing.contains(&task);
            let slow = self.slow.contains(&task);
            let stop = self.stop.clone();
            Box::pin(async move {
                log.lock().unwrap().push(format!("start {task}"));
                if slow {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                if task.is_long_running() && !fail {
                    stop.notified().await;
                }
                log.lock().unwrap().push(format!("end {task}"));
                if fail {
                    return Err(AssetdagError::TaskFailed {
                        task,
                        source: anyhow!("boom"),
                    });
                }
                Ok(TaskReport::default())
            })
        }

        fn request_stop(&self) {
            self.log.lock().unwrap().push("stop requested".to_string());
            self.stop.notify_waiters();
            // Covers a sibling that has not reached `notified()` yet.
            self.stop.notify_one();
        }
    }

    #[test]
    fn build_and_watch_compositions() {
        assert_eq!(
            Flow::build().to_string(),
            "series(clean, parallel(buildImg, favicon), minify)"
        );
        assert_eq!(
            Flow::watch().to_string(),
            "series(parallel(buildScss, buildJs), buildCss, parallel(watchFiles, browserSync))"
        );
    }

    #[tokio::test]
    async fn series_stops_at_first_failure() {
        let recorder = Recorder {
            failing: vec![TaskName::Clean],
            ..Recorder::default()
        };
        let log = recorder.log.clone();

        let err = Flow::build().run_with(Arc::new(recorder)).await.unwrap_err();

        assert!(matches!(err, AssetdagError::TaskFailed { task: TaskName::Clean, .. }));
        assert_eq!(*log.lock().unwrap(), vec!["start clean", "end clean"]);
    }

    #[tokio::test]
    async fn parallel_waits_for_all_branches_before_failing() {
        let recorder = Recorder {
            failing: vec![TaskName::Favicon],
            slow: vec![TaskName::BuildImg],
            ..Recorder::default()
        };
        let log = recorder.log.clone();

        let err = Flow::build().run_with(Arc::new(recorder)).await.unwrap_err();

        assert!(matches!(err, AssetdagError::TaskFailed { task: TaskName::Favicon, .. }));
        let log = log.lock().unwrap();
        assert!(log.contains(&"end buildImg".to_string()));
        assert!(!log.iter().any(|l| l.contains("minify")));
    }

    #[tokio::test]
    async fn successful_build_runs_every_task_once() {
        let recorder = Recorder::default();
        let log = recorder.log.clone();

        Flow::build().run_with(Arc::new(recorder)).await.unwrap();

        let starts = log.lock().unwrap().iter().filter(|l| l.starts_with("start")).count();
        assert_eq!(starts, 4);
        assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("end minify"));
    }

    #[tokio::test]
    async fn failing_server_stops_the_watchers_and_surfaces_the_error() {
        let recorder = Recorder {
            failing: vec![TaskName::BrowserSync],
            slow: vec![TaskName::BrowserSync],
            ..Recorder::default()
        };
        let log = recorder.log.clone();
        let flow = Flow::parallel([Flow::task(TaskName::WatchFiles), Flow::task(TaskName::BrowserSync)]);

        let err = tokio::time::timeout(Duration::from_secs(2), flow.run_with(Arc::new(recorder)))
            .await
            .expect("failure should end the group without Ctrl-C")
            .unwrap_err();

        assert!(matches!(err, AssetdagError::TaskFailed { task: TaskName::BrowserSync, .. }));
        let log = log.lock().unwrap();
        assert!(log.contains(&"stop requested".to_string()));
        assert!(log.contains(&"end watchFiles".to_string()));
    }

    #[tokio::test]
    async fn short_parallel_failure_does_not_request_stop() {
        let recorder = Recorder {
            failing: vec![TaskName::Favicon],
            ..Recorder::default()
        };
        let log = recorder.log.clone();

        Flow::build().run_with(Arc::new(recorder)).await.unwrap_err();

        assert!(!log.lock().unwrap().contains(&"stop requested".to_string()));
    }
}
