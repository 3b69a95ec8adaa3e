// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    /// File contents plus a logical modification tick.
    File(Vec<u8>, u64),
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, MockEntry>,
    clock: u64,
}

/// In-memory filesystem with a logical clock.
///
/// Every write advances the clock by one tick, so a file written later is
/// always strictly newer than one written earlier. Tests can pin times with
/// [`MockFileSystem::set_modified`].
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state.files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let tick = state.clock;
        state.files.insert(path.clone(), MockEntry::File(content.into(), tick));

        if let Some(parent) = non_empty_parent(&path) {
            Self::ensure_dir_entry(&mut state.files, &parent);
            Self::link_child(&mut state.files, &parent, &path);
        }
    }

    /// Pin the modification tick of an existing file.
    pub fn set_modified(&self, path: impl AsRef<Path>, tick: u64) {
        let mut state = self.state.lock().unwrap();
        if let Some(MockEntry::File(_, t)) = state.files.get_mut(path.as_ref()) {
            *t = tick;
        }
        state.clock = state.clock.max(tick);
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = non_empty_parent(path) {
            if parent != path {
                Self::ensure_dir_entry(files, &parent);
                Self::link_child(files, &parent, path);
            }
        }
    }

    fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
        if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

fn non_empty_parent(path: &Path) -> Option<PathBuf> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        }
    })
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let state = self.state.lock().unwrap();
        match state.files.get(path) {
            Some(MockEntry::File(content, _)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.files.get(path), Some(MockEntry::File(..)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.files.get(path), Some(MockEntry::Dir(_)))
    }

    fn modified(&self, path: &Path) -> Option<SystemTime> {
        let state = self.state.lock().unwrap();
        match state.files.get(path) {
            Some(MockEntry::File(_, tick)) => Some(UNIX_EPOCH + Duration::from_secs(*tick)),
            Some(MockEntry::Dir(_)) => Some(UNIX_EPOCH),
            None => None,
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_dir_entry(&mut state.files, path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        if !state.files.contains_key(path) {
            return Ok(false);
        }
        state.files.retain(|p, _| !p.starts_with(path));
        if let Some(parent) = non_empty_parent(path) {
            if let (Some(MockEntry::Dir(children)), Some(name)) =
                (state.files.get_mut(&parent), path.file_name().and_then(|n| n.to_str()))
            {
                children.retain(|c| c != name);
            }
        }
        Ok(true)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        match state.files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_writes_are_newer() {
        let fs = MockFileSystem::new();
        fs.add_file("a.txt", "a");
        fs.add_file("b.txt", "b");
        assert!(fs.modified(Path::new("b.txt")) > fs.modified(Path::new("a.txt")));
    }

    #[test]
    fn remove_dir_all_is_recursive_and_idempotent() {
        let fs = MockFileSystem::new();
        fs.add_file("dist/js/app.js", "x");
        fs.add_file("src/index.html", "y");

        assert!(fs.remove_dir_all(Path::new("dist")).unwrap());
        assert!(!fs.exists(Path::new("dist/js/app.js")));
        assert!(!fs.remove_dir_all(Path::new("dist")).unwrap());
        assert_eq!(fs.read_dir(Path::new(".")).unwrap(), vec![PathBuf::from("./src")]);
    }
}
