// src/exec/backend.rs

//! Pluggable action backend.
//!
//! The watch runtime talks to an `ActionBackend` instead of running tasks
//! itself. This makes it easy to swap in a fake backend in tests.
//!
//! - [`TaskBackend`] is the production implementation: it runs the bound
//!   task (or sends a page reload) on a spawned Tokio task and reports
//!   `WatchEvent::Finished` back to the runtime.
//! - Tests can provide their own backend that records dispatches and
//!   completes them on demand.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::engine::{ActionOutcome, BindingName, WatchEvent};
use crate::errors::{AssetdagError, Result};
use crate::tasks::{TaskContext, run_task};
use crate::watch::{WatchAction, WatchBinding};

/// Trait abstracting how binding actions are executed.
pub trait ActionBackend: Send {
    /// Start the action bound to `binding`.
    ///
    /// Must not wait for the action to finish; completion is reported as a
    /// `WatchEvent::Finished` on the runtime channel.
    fn dispatch(
        &mut self,
        binding: BindingName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Runs binding actions against the real task context.
pub struct TaskBackend {
    ctx: Arc<TaskContext>,
    actions: HashMap<BindingName, WatchAction>,
    runtime_tx: mpsc::Sender<WatchEvent>,
}

impl TaskBackend {
    pub fn new(
        ctx: Arc<TaskContext>,
        bindings: &[WatchBinding],
        runtime_tx: mpsc::Sender<WatchEvent>,
    ) -> Self {
        let actions = bindings
            .iter()
            .map(|b| (b.name().to_string(), b.action()))
            .collect();
        Self {
            ctx,
            actions,
            runtime_tx,
        }
    }
}

impl ActionBackend for TaskBackend {
    fn dispatch(
        &mut self,
        binding: BindingName,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let action = self.actions.get(&binding).copied();
        let ctx = self.ctx.clone();
        let tx = self.runtime_tx.clone();

        Box::pin(async move {
            let action = action.ok_or_else(|| {
                AssetdagError::ConfigError(format!("no action registered for binding '{binding}'"))
            })?;

            tokio::spawn(async move {
                let outcome = match action {
                    WatchAction::ReloadPage => {
                        ctx.reload.reload_page();
                        ActionOutcome::Success
                    }
                    WatchAction::RunTask(task) => match run_task(ctx, task).await {
                        Ok(_) => ActionOutcome::Success,
                        Err(err) => {
                            error!(binding = %binding, error = %format!("{err:#}"), "watch action failed");
                            ActionOutcome::Failed
                        }
                    },
                };
                debug!(binding = %binding, ?outcome, "watch action finished");
                let _ = tx.send(WatchEvent::Finished { binding, outcome }).await;
            });
            Ok(())
        })
    }
}
