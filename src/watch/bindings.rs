// src/watch/bindings.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};

use crate::config::PathRegistry;
use crate::tasks::TaskName;

/// What a watch binding does when one of its files changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchAction {
    RunTask(TaskName),
    ReloadPage,
}

impl fmt::Display for WatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchAction::RunTask(task) => write!(f, "run {task}"),
            WatchAction::ReloadPage => f.write_str("page reload"),
        }
    }
}

/// A glob pattern (relative to the project root) tied to an action.
#[derive(Clone)]
pub struct WatchBinding {
    name: String,
    pattern: String,
    matcher: GlobMatcher,
    action: WatchAction,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("action", &self.action)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(name: &str, pattern: &str, action: WatchAction) -> Result<Self> {
        // `*` stays within one path segment, as in source patterns.
        let matcher = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid watch pattern: {pattern}"))?
            .compile_matcher();
        Ok(Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            matcher,
            action,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn action(&self) -> WatchAction {
        self.action
    }

    /// `rel_path` uses forward slashes and is relative to the project root.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// The three bindings registered by `watchFiles`.
pub fn build_bindings(paths: &PathRegistry) -> Result<Vec<WatchBinding>> {
    Ok(vec![
        WatchBinding::new("styles", &paths.styles.watch, WatchAction::RunTask(TaskName::BuildScss))?,
        WatchBinding::new("markup", &paths.markup.sources, WatchAction::ReloadPage)?,
        WatchBinding::new("images", &paths.images.watch, WatchAction::RunTask(TaskName::BuildImg))?,
    ])
}
