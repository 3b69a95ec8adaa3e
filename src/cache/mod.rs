// src/cache/mod.rs

//! Content-addressed cache for transform results.
//!
//! Entries are keyed by a blake3 hash over the input's relative path, its
//! contents and a fingerprint of the transform settings, so changing either
//! the file or the settings misses the cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;
use crate::types::CacheStorageMode;

/// Relative path (from the project root) of the on-disk image cache.
pub const CACHE_DIR: &str = ".assetdag/cache/images";

/// Compute the cache key for one input.
pub fn cache_key(rel_path: &Path, contents: &[u8], fingerprint: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(rel_path.to_string_lossy().replace('\\', "/").as_bytes());
    hasher.update(&[0u8]);
    hasher.update(fingerprint.as_bytes());
    hasher.update(&[0u8]);
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}

/// Abstract storage for cached transform outputs.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, key: &str, contents: &[u8]) -> Result<()>;
}

/// Build the store selected by `[config].cache_storage`.
pub fn open_store(
    mode: CacheStorageMode,
    root: &Path,
    fs: Arc<dyn FileSystem>,
) -> Box<dyn CacheStore> {
    match mode {
        CacheStorageMode::File => Box::new(FileCacheStore::new(root.join(CACHE_DIR), fs)),
        CacheStorageMode::Memory => Box::new(MemoryCacheStore::new()),
    }
}

/// Stores entries as files named by their key.
pub struct FileCacheStore {
    dir: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileCacheStore {
    pub fn new(dir: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { dir, fs }
    }
}

impl CacheStore for FileCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.dir.join(key);
        if !self.fs.is_file(&path) {
            return Ok(None);
        }
        Ok(Some(self.fs.read(&path)?))
    }

    fn put(&mut self, key: &str, contents: &[u8]) -> Result<()> {
        self.fs.write(&self.dir.join(key), contents)?;
        debug!(key, bytes = contents.len(), "stored cache entry (file)");
        Ok(())
    }
}

/// Stores entries in memory only.
#[derive(Default)]
pub struct MemoryCacheStore {
    map: HashMap<String, Vec<u8>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.map.get(key).cloned())
    }

    fn put(&mut self, key: &str, contents: &[u8]) -> Result<()> {
        self.map.insert(key.to_string(), contents.to_vec());
        debug!(key, bytes = contents.len(), "stored cache entry (memory)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn key_depends_on_path_contents_and_settings() {
        let base = cache_key(Path::new("a.png"), b"data", "level=5");
        assert_eq!(base, cache_key(Path::new("a.png"), b"data", "level=5"));
        assert_ne!(base, cache_key(Path::new("b.png"), b"data", "level=5"));
        assert_ne!(base, cache_key(Path::new("a.png"), b"other", "level=5"));
        assert_ne!(base, cache_key(Path::new("a.png"), b"data", "level=2"));
    }

    #[test]
    fn file_store_round_trips_through_filesystem() {
        let fs = Arc::new(MockFileSystem::new());
        let mut store = open_store(CacheStorageMode::File, Path::new("/proj"), fs.clone());

        assert!(store.get("k").unwrap().is_none());
        store.put("k", b"optimized").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"optimized"[..]));
        assert!(fs.is_file(Path::new("/proj/.assetdag/cache/images/k")));
    }
}
