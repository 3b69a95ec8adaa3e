// src/watch/mod.rs

//! `watchFiles`: file watching and the watch runtime.
//!
//! This module is responsible for:
//! - Compiling the watch bindings from the path registry.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Running the watch runtime until shutdown.

pub mod bindings;
pub mod event_handler;
pub mod watcher;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;

use crate::engine::{CoreRuntime, WatchEvent, WatchRuntime};
use crate::exec::TaskBackend;
use crate::tasks::TaskContext;

pub use bindings::{WatchAction, WatchBinding, build_bindings};
pub use watcher::{WatcherHandle, spawn_watcher};

/// Register the watch bindings and run their actions until shutdown.
pub async fn watch_files(ctx: Arc<TaskContext>) -> Result<()> {
    let bindings = build_bindings(&ctx.config.paths)?;
    for binding in &bindings {
        info!(binding = binding.name(), pattern = binding.pattern(), action = %binding.action(), "watching");
    }

    let (tx, rx) = mpsc::channel::<WatchEvent>(64);
    let backend = TaskBackend::new(ctx.clone(), &bindings, tx.clone());
    let _watcher = spawn_watcher(ctx.root.clone(), bindings, tx.clone())?;

    // Shutdown request → graceful stop of the runtime loop.
    {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            ctx.shutdown_requested().await;
            let _ = tx.send(WatchEvent::ShutdownRequested).await;
        });
    }

    let policy = &ctx.config.config;
    let core = CoreRuntime::new(policy.triggered_while_running_behaviour, policy.queue_length);
    WatchRuntime::new(core, rx, backend).run().await?;
    Ok(())
}
