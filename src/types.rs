use serde::Deserialize;

/// Behaviour when a watch trigger arrives while the same binding's action is
/// still running.
///
/// - `Queue`: keep at most one run in flight per binding and remember the
///   trigger as a pending rerun (default behaviour).
/// - `Overlap`: start a new run immediately, even if one is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    Queue,
    Overlap,
}

impl Default for TriggerWhileRunningBehaviour {
    fn default() -> Self {
        TriggerWhileRunningBehaviour::Queue
    }
}

/// Where optimized images are cached between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStorageMode {
    /// Store entries under `.assetdag/cache/images/`.
    File,
    /// Keep entries in memory only (lost on restart).
    Memory,
}

impl Default for CacheStorageMode {
    fn default() -> Self {
        CacheStorageMode::File
    }
}
