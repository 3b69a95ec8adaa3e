// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ActionBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, WatchEvent};

/// Drives the [`CoreRuntime`] from a channel of [`WatchEvent`]s and
/// delegates the actual actions to an [`ActionBackend`].
///
/// All trigger semantics live in the core; this struct only does async IO.
pub struct WatchRuntime<B: ActionBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<WatchEvent>,
    backend: B,
}

impl<B: ActionBackend> fmt::Debug for WatchRuntime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: ActionBackend> WatchRuntime<B> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<WatchEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
        }
    }

    /// Main event loop. Returns on shutdown or when every sender is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("watch runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "watch runtime received event");

            let step = self.core.step(event);
            for command in step.commands {
                match command {
                    CoreCommand::Dispatch(binding) => {
                        debug!(binding = %binding, "dispatching watch action");
                        self.backend.dispatch(binding).await?;
                    }
                }
            }

            if !step.keep_running {
                info!("shutdown requested; stopping watch runtime");
                return Ok(());
            }
        }

        info!("watch event channel closed; exiting");
        Ok(())
    }
}
