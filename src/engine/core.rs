// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`WatchEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::WatchRuntime`) is responsible for
//! reading events from channels and handing dispatches to the backend.
//!
//! The core is unit tested without any Tokio, channels or filesystem.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::queue::TriggerQueue;
use super::{ActionOutcome, BindingName, WatchEvent};
use crate::types::TriggerWhileRunningBehaviour;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start the binding's action.
    Dispatch(BindingName),
}

/// Decision returned by the core after handling a single [`WatchEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn run(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    behaviour: TriggerWhileRunningBehaviour,
    queue: TriggerQueue,
    /// Number of in-flight actions per binding.
    running: HashMap<BindingName, usize>,
}

impl CoreRuntime {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, queue_length: usize) -> Self {
        Self {
            behaviour,
            queue: TriggerQueue::new(queue_length),
            running: HashMap::new(),
        }
    }

    /// Number of in-flight actions for `binding`.
    pub fn running(&self, binding: &str) -> usize {
        self.running.get(binding).copied().unwrap_or(0)
    }

    /// True if nothing is running and nothing is pending.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty() && self.queue.is_empty()
    }

    pub fn pending(&self, binding: &str) -> usize {
        self.queue.pending(binding)
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: WatchEvent) -> CoreStep {
        match event {
            WatchEvent::Triggered { binding } => self.handle_trigger(binding),
            WatchEvent::Finished { binding, outcome } => self.handle_finished(binding, outcome),
            WatchEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn handle_trigger(&mut self, binding: BindingName) -> CoreStep {
        let busy = self.running(&binding) > 0;
        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue if busy => {
                self.queue.record_trigger(&binding);
                CoreStep::run(Vec::new())
            }
            _ => CoreStep::run(vec![self.start(binding)]),
        }
    }

    fn handle_finished(&mut self, binding: BindingName, outcome: ActionOutcome) -> CoreStep {
        if outcome == ActionOutcome::Failed {
            warn!(binding = %binding, "watch action failed; still watching");
        }

        match self.running.get_mut(&binding) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.running.remove(&binding);
            }
            None => {
                debug!(binding = %binding, "finish for a binding that was not running; ignoring");
                return CoreStep::run(Vec::new());
            }
        }

        let mut commands = Vec::new();
        if self.running(&binding) == 0 && self.queue.take(&binding) {
            commands.push(self.start(binding));
        }
        CoreStep::run(commands)
    }

    fn start(&mut self, binding: BindingName) -> CoreCommand {
        *self.running.entry(binding.clone()).or_insert(0) += 1;
        CoreCommand::Dispatch(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger(b: &str) -> WatchEvent {
        WatchEvent::Triggered {
            binding: b.to_string(),
        }
    }

    fn finished(b: &str, outcome: ActionOutcome) -> WatchEvent {
        WatchEvent::Finished {
            binding: b.to_string(),
            outcome,
        }
    }

    fn dispatch(b: &str) -> Vec<CoreCommand> {
        vec![CoreCommand::Dispatch(b.to_string())]
    }

    #[test]
    fn queue_mode_runs_one_at_a_time_and_coalesces() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);

        assert_eq!(core.step(trigger("styles")).commands, dispatch("styles"));
        assert!(core.step(trigger("styles")).commands.is_empty());
        assert!(core.step(trigger("styles")).commands.is_empty());
        assert_eq!(core.pending("styles"), 1);

        assert_eq!(
            core.step(finished("styles", ActionOutcome::Success)).commands,
            dispatch("styles")
        );
        assert!(core.step(finished("styles", ActionOutcome::Success)).commands.is_empty());
        assert!(core.is_idle());
    }

    #[test]
    fn bindings_do_not_block_each_other() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
        assert_eq!(core.step(trigger("styles")).commands, dispatch("styles"));
        assert_eq!(core.step(trigger("images")).commands, dispatch("images"));
    }

    #[test]
    fn overlap_mode_dispatches_every_trigger() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Overlap, 1);
        for _ in 0..3 {
            assert_eq!(core.step(trigger("images")).commands, dispatch("images"));
        }
        assert_eq!(core.running("images"), 3);
    }

    #[test]
    fn failures_do_not_stop_the_runtime() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
        core.step(trigger("styles"));
        core.step(trigger("styles"));

        let step = core.step(finished("styles", ActionOutcome::Failed));
        assert!(step.keep_running);
        assert_eq!(step.commands, dispatch("styles"));
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, 1);
        assert!(!core.step(WatchEvent::ShutdownRequested).keep_running);
    }
}
