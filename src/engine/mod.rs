// src/engine/mod.rs

//! Watch runtime.
//!
//! File events become [`WatchEvent::Triggered`] for a watch binding; the
//! runtime decides when that binding's action runs. The policy for triggers
//! that arrive while the action is still running lives in the pure
//! [`core`] state machine; [`runtime`] is the async shell that feeds it
//! from a channel and hands dispatches to an [`ActionBackend`].
//!
//! [`ActionBackend`]: crate::exec::ActionBackend

/// Name of a watch binding (`styles`, `markup`, `images`).
pub type BindingName = String;

/// How a dispatched action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Failed,
}

/// Events flowing into the watch runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file matching the binding changed.
    Triggered { binding: BindingName },
    /// A dispatched action finished.
    Finished {
        binding: BindingName,
        outcome: ActionOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod queue;
pub mod runtime;

pub use crate::types::TriggerWhileRunningBehaviour;
pub use core::{CoreCommand, CoreRuntime, CoreStep};
pub use queue::TriggerQueue;
pub use runtime::WatchRuntime;
