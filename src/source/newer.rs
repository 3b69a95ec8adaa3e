// src/source/newer.rs

//! Newer-than checks: skip work when an output is not older than its inputs.

use std::path::Path;
use std::time::SystemTime;

use crate::fs::FileSystem;

/// True if `dest` exists and its modification time is not older than
/// `newest_input`.
///
/// An input without a readable modification time is treated as changed.
pub fn is_up_to_date(fs: &dyn FileSystem, newest_input: Option<SystemTime>, dest: &Path) -> bool {
    match (newest_input, fs.modified(dest)) {
        (Some(input), Some(output)) => output >= input,
        _ => false,
    }
}

/// Newest modification time among `paths`, or `None` if any of them has no
/// readable modification time.
pub fn newest_mtime<'a, I>(fs: &dyn FileSystem, paths: I) -> Option<SystemTime>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut newest: Option<SystemTime> = None;
    for path in paths {
        let t = fs.modified(path)?;
        newest = Some(newest.map_or(t, |n| n.max(t)));
    }
    newest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn up_to_date_holds_both_directions() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src.js", "a");
        fs.add_file("/p/dest.js", "a");

        let src = fs.modified(Path::new("/p/src.js"));
        assert!(is_up_to_date(&fs, src, Path::new("/p/dest.js")));

        fs.set_modified("/p/src.js", 100);
        let src = fs.modified(Path::new("/p/src.js"));
        assert!(!is_up_to_date(&fs, src, Path::new("/p/dest.js")));
    }

    #[test]
    fn equal_times_count_as_up_to_date() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a", "a");
        fs.add_file("/p/b", "b");
        fs.set_modified("/p/a", 7);
        fs.set_modified("/p/b", 7);
        assert!(is_up_to_date(&fs, fs.modified(Path::new("/p/a")), Path::new("/p/b")));
    }

    #[test]
    fn missing_destination_is_stale() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a", "a");
        assert!(!is_up_to_date(&fs, fs.modified(Path::new("/p/a")), Path::new("/p/missing")));
    }

    #[test]
    fn newest_mtime_is_none_when_an_input_is_missing() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/a", "a");
        assert!(newest_mtime(&fs, [Path::new("/p/a")]).is_some());
        assert!(newest_mtime(&fs, [Path::new("/p/a"), Path::new("/p/zz")]).is_none());
    }
}
