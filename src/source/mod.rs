// src/source/mod.rs

//! Source sets: glob patterns resolved to files on disk.
//!
//! A pattern is split into a *base* (the leading path components without glob
//! metacharacters) and the glob itself. Matched files keep their path
//! relative to the base, which is what tasks use to lay out their outputs:
//! `src/scss/app/main.scss` matched by `src/scss/**/*.scss` has the relative
//! path `app/main.scss`.

pub mod newer;

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::errors::{AssetdagError, Result};
use crate::fs::FileSystem;

pub use newer::{is_up_to_date, newest_mtime};

/// A file matched by a [`SourceSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path (project root joined with the matched path).
    pub path: PathBuf,
    /// Path relative to the pattern's base.
    pub rel: PathBuf,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Pattern without metacharacters: exactly one file, which must exist.
    Singular,
    Glob(GlobMatcher),
}

/// An immutable glob pattern, anchored at a project root.
#[derive(Debug, Clone)]
pub struct SourceSet {
    root: PathBuf,
    pattern: String,
    base: PathBuf,
    matcher: Matcher,
}

impl SourceSet {
    pub fn new(root: impl Into<PathBuf>, pattern: &str) -> Result<Self> {
        let root = root.into();
        let pattern = pattern.replace('\\', "/");
        let base = glob_base(&pattern);

        let matcher = if has_glob_meta(&pattern) {
            let glob = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| AssetdagError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            Matcher::Glob(glob.compile_matcher())
        } else {
            Matcher::Singular
        };

        Ok(Self {
            root,
            pattern,
            base,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Absolute base directory of this set.
    pub fn base_dir(&self) -> PathBuf {
        self.root.join(&self.base)
    }

    /// Resolve the pattern against the filesystem, sorted by relative path.
    ///
    /// A singular pattern whose file is missing is an error; a glob whose base
    /// directory does not exist resolves to nothing.
    pub fn resolve(&self, fs: &dyn FileSystem) -> Result<Vec<SourceFile>> {
        match &self.matcher {
            Matcher::Singular => {
                let path = self.root.join(&self.pattern);
                if !fs.is_file(&path) {
                    return Err(AssetdagError::SourceNotFound(path));
                }
                let rel = path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(&self.pattern));
                Ok(vec![SourceFile { path, rel }])
            }
            Matcher::Glob(glob) => self.walk(fs, glob),
        }
    }

    fn walk(&self, fs: &dyn FileSystem, glob: &GlobMatcher) -> Result<Vec<SourceFile>> {
        let base_dir = self.base_dir();
        let mut files = Vec::new();

        if !fs.is_dir(&base_dir) {
            debug!(pattern = %self.pattern, base = ?base_dir, "source base missing; empty set");
            return Ok(files);
        }

        let mut stack = vec![base_dir.clone()];
        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    // Linked directories are not descended into; a link back
                    // to an ancestor would never end.
                    if fs.is_symlink(&path) {
                        debug!(dir = ?path, "skipping symlinked directory");
                        continue;
                    }
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Ok(rel_root) = path.strip_prefix(&self.root) else {
                        continue;
                    };
                    let rel_str = rel_root.to_string_lossy().replace('\\', "/");
                    if glob.is_match(&rel_str) {
                        let rel = path
                            .strip_prefix(&base_dir)
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|_| rel_root.to_path_buf());
                        files.push(SourceFile { path, rel });
                    }
                }
            }
        }

        files.sort_by(|a, b| a.rel.cmp(&b.rel));
        debug!(pattern = %self.pattern, count = files.len(), "resolved source set");
        Ok(files)
    }
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Leading components of `pattern` that contain no glob metacharacters.
///
/// For a singular pattern this is the parent directory.
fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty() && *c != ".").collect();
    let literal = !has_glob_meta(pattern);

    for (i, comp) in components.iter().enumerate() {
        if has_glob_meta(comp) || (literal && i + 1 == components.len()) {
            break;
        }
        base.push(comp);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn base_stops_at_first_glob_component() {
        assert_eq!(glob_base("src/scss/**/*.scss"), PathBuf::from("src/scss"));
        assert_eq!(glob_base("./src/**/*.html"), PathBuf::from("src"));
        assert_eq!(glob_base("src/favicon.ico"), PathBuf::from("src"));
        assert_eq!(glob_base("*.html"), PathBuf::new());
    }

    #[test]
    fn resolves_glob_relative_to_base() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/src/media/img/logo.png", "png");
        fs.add_file("/proj/src/media/img/icons/a.svg", "svg");
        fs.add_file("/proj/src/media/img/notes.txt", "txt");

        let set = SourceSet::new("/proj", "src/media/img/**/*.{png,svg}").unwrap();
        let files = set.resolve(&fs).unwrap();

        let rels: Vec<_> = files.iter().map(|f| f.rel.clone()).collect();
        assert_eq!(rels, vec![PathBuf::from("icons/a.svg"), PathBuf::from("logo.png")]);
        assert_eq!(files[1].path, PathBuf::from("/proj/src/media/img/logo.png"));
    }

    #[test]
    fn star_does_not_cross_directories() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/src/a.html", "a");
        fs.add_file("/proj/src/pages/b.html", "b");

        let set = SourceSet::new("/proj", "src/*.html").unwrap();
        assert_eq!(set.resolve(&fs).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        use crate::fs::RealFileSystem;

        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("src/pages")).unwrap();
        std::fs::write(root.join("src/index.html"), "a").unwrap();
        std::fs::write(root.join("src/pages/about.html"), "b").unwrap();
        std::os::unix::fs::symlink(root.join("src"), root.join("src/pages/loop")).unwrap();

        let set = SourceSet::new(root, "src/**/*.html").unwrap();
        let rels: Vec<_> = set
            .resolve(&RealFileSystem)
            .unwrap()
            .into_iter()
            .map(|f| f.rel)
            .collect();
        assert_eq!(rels, vec![PathBuf::from("index.html"), PathBuf::from("pages/about.html")]);
    }

    #[test]
    fn missing_glob_base_is_empty_but_missing_singular_is_error() {
        let fs = MockFileSystem::new();

        let glob = SourceSet::new("/proj", "src/scss/**/*.scss").unwrap();
        assert!(glob.resolve(&fs).unwrap().is_empty());

        let single = SourceSet::new("/proj", "src/favicon.ico").unwrap();
        match single.resolve(&fs) {
            Err(AssetdagError::SourceNotFound(p)) => {
                assert_eq!(p, PathBuf::from("/proj/src/favicon.ico"))
            }
            other => panic!("expected SourceNotFound, got {other:?}"),
        }
    }
}
