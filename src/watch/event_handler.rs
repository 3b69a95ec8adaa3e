// src/watch/event_handler.rs

//! Turning filesystem events into binding triggers.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use notify::EventKind;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::WatchEvent;
use crate::watch::bindings::WatchBinding;

/// Access events (open, read, close-without-write) never trigger anything.
pub fn is_relevant(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

/// `path` relative to `root` with forward slashes, as bindings match it.
///
/// Event paths may carry a different absolute prefix than the root (symlinked
/// temp dirs on macOS). Removed files cannot be canonicalized, so the
/// fallback canonicalizes the parent directory instead.
fn project_relative(root: &Path, path: &Path) -> Option<String> {
    let to_str = |rel: &Path| rel.to_string_lossy().replace('\\', "/");

    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_str(rel));
    }

    let root = root.canonicalize().ok()?;
    let parent = path.parent()?.canonicalize().ok()?;
    let rel = parent.strip_prefix(&root).ok()?;
    Some(match path.file_name() {
        Some(name) => to_str(&rel.join(name)),
        None => to_str(rel),
    })
}

/// Names of the bindings interested in any of `paths`, deduplicated.
pub fn matching_bindings<'a>(
    root: &Path,
    paths: &[PathBuf],
    bindings: &'a [WatchBinding],
) -> BTreeSet<&'a str> {
    let mut names = BTreeSet::new();
    for path in paths {
        let Some(rel) = project_relative(root, path) else {
            warn!(?path, ?root, "could not relativize path against root");
            continue;
        };
        debug!(?path, rel = %rel, "normalized event path");
        for binding in bindings.iter().filter(|b| b.matches(&rel)) {
            names.insert(binding.name());
        }
    }
    names
}

/// Forward one notify event to the runtime as `Triggered` events.
pub async fn process_event(
    root: &Path,
    kind: &EventKind,
    paths: &[PathBuf],
    bindings: &[WatchBinding],
    runtime_tx: &mpsc::Sender<WatchEvent>,
) {
    if !is_relevant(kind) {
        return;
    }

    for name in matching_bindings(root, paths, bindings) {
        debug!(binding = name, "file change triggers binding");
        let event = WatchEvent::Triggered {
            binding: name.to_string(),
        };
        if let Err(err) = runtime_tx.send(event).await {
            warn!("failed to send trigger to runtime: {err}");
        }
    }
}
