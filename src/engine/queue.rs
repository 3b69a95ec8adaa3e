// src/engine/queue.rs

use std::collections::HashMap;

use tracing::debug;

use super::BindingName;

/// Pending reruns per watch binding.
///
/// Semantics:
/// - A trigger that arrives while the binding's action is running is
///   remembered as one pending rerun.
/// - At most `max_pending` reruns are remembered per binding (`queue_length`,
///   default 1); further triggers coalesce into the ones already pending.
/// - When the running action finishes, the runtime takes one pending rerun
///   and dispatches it.
#[derive(Debug)]
pub struct TriggerQueue {
    max_pending: usize,
    pending: HashMap<BindingName, usize>,
}

impl TriggerQueue {
    /// `max_pending` is clamped to at least 1; config validation already
    /// rejects 0.
    pub fn new(max_pending: usize) -> Self {
        Self {
            max_pending: max_pending.max(1),
            pending: HashMap::new(),
        }
    }

    /// True if no binding has a pending rerun.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self, binding: &str) -> usize {
        self.pending.get(binding).copied().unwrap_or(0)
    }

    /// Remember a trigger. Returns `false` if it coalesced into an existing
    /// pending rerun.
    pub fn record_trigger(&mut self, binding: &str) -> bool {
        let count = self.pending.entry(binding.to_string()).or_insert(0);
        if *count < self.max_pending {
            *count += 1;
            debug!(binding, pending = *count, "queued rerun");
            true
        } else {
            debug!(binding, pending = *count, "coalesced trigger into pending rerun");
            false
        }
    }

    /// Take one pending rerun for `binding`, if any.
    pub fn take(&mut self, binding: &str) -> bool {
        let Some(count) = self.pending.get_mut(binding) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.pending.remove(binding);
        }
        true
    }
}
