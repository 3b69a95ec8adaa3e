// src/config/registry.rs

//! The path registry: one record per asset category, mapping it to source
//! globs and destination directories.
//!
//! All paths are relative to the project root. Every record is deserialized
//! with `#[serde(default)]`, so a config file only needs to mention the
//! fields it overrides:
//!
//! ```toml
//! [paths.images]
//! dist = "public/img"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Scripts: vendor files copied into the source tree, plus the bundled output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScriptPaths {
    /// Directory the vendor scripts are copied into.
    pub lib: String,
    /// Pre-built vendor scripts (DOM query, UI components, positioning).
    pub vendor: Vec<String>,
    /// Where bundled scripts end up after `minify`.
    pub dist: String,
}

impl Default for ScriptPaths {
    fn default() -> Self {
        Self {
            lib: "src/js/lib".to_string(),
            vendor: vec![
                "node_modules/jquery/dist/jquery.min.js".to_string(),
                "node_modules/bootstrap/dist/js/bootstrap.min.js".to_string(),
                "node_modules/popper.js/dist/popper.min.js".to_string(),
            ],
            dist: "dist/js".to_string(),
        }
    }
}

/// Style sources compiled by `buildScss`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StylePaths {
    pub sources: String,
    /// Pattern for the watch binding that recompiles styles.
    pub watch: String,
}

impl Default for StylePaths {
    fn default() -> Self {
        Self {
            sources: "src/scss/**/*.scss".to_string(),
            watch: "src/scss/**/*".to_string(),
        }
    }
}

/// Compiled and framework stylesheets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CssPaths {
    /// Pre-built framework stylesheet.
    pub framework: String,
    /// Output directory of `buildScss`.
    pub app: String,
    /// Output directory of `buildCss`.
    pub frame: String,
}

impl Default for CssPaths {
    fn default() -> Self {
        Self {
            framework: "node_modules/bootstrap/dist/css/bootstrap.min.css".to_string(),
            app: "src/css".to_string(),
            frame: "src/css/framework".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MarkupPaths {
    pub sources: String,
    pub dist: String,
}

impl Default for MarkupPaths {
    fn default() -> Self {
        Self {
            sources: "src/**/*.html".to_string(),
            dist: "dist".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FaviconPaths {
    pub source: String,
    pub dist: String,
}

impl Default for FaviconPaths {
    fn default() -> Self {
        Self {
            source: "src/favicon.ico".to_string(),
            dist: "dist".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImagePaths {
    pub sources: String,
    pub dist: String,
    /// Pattern for the watch binding that re-optimizes images.
    pub watch: String,
}

impl Default for ImagePaths {
    fn default() -> Self {
        Self {
            sources: "src/media/img/**/*.{png,jpg,jpeg,gif,svg,ico}".to_string(),
            dist: "dist/media/img".to_string(),
            watch: "src/media/img/**/*".to_string(),
        }
    }
}

/// `[paths]` section: the full registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathRegistry {
    /// Distribution root removed by `clean`.
    pub dist_root: String,
    pub scripts: ScriptPaths,
    pub styles: StylePaths,
    pub css: CssPaths,
    pub markup: MarkupPaths,
    pub favicon: FaviconPaths,
    pub images: ImagePaths,
}

impl Default for PathRegistry {
    fn default() -> Self {
        Self {
            dist_root: "dist".to_string(),
            scripts: ScriptPaths::default(),
            styles: StylePaths::default(),
            css: CssPaths::default(),
            markup: MarkupPaths::default(),
            favicon: FaviconPaths::default(),
            images: ImagePaths::default(),
        }
    }
}

impl PathRegistry {
    /// Directory-valued destinations, labelled by the task category that
    /// owns them.
    pub fn destination_dirs(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("buildScss", self.css.app.as_str()),
            ("buildCss", self.css.frame.as_str()),
            ("buildJs", self.scripts.lib.as_str()),
            ("buildImg", self.images.dist.as_str()),
            ("minify", self.markup.dist.as_str()),
        ]
    }

    /// Output path of the favicon copy.
    pub fn favicon_target(&self) -> PathBuf {
        let name = Path::new(&self.favicon.source)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("favicon.ico"));
        Path::new(&self.favicon.dist).join(name)
    }
}

/// Resolve a registry path against the project root.
pub fn resolve(root: &Path, rel: &str) -> PathBuf {
    let p = Path::new(rel);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        root.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_override_keeps_other_defaults() {
        let reg: PathRegistry = toml::from_str(
            r#"
[images]
dist = "public/img"
"#,
        )
        .unwrap();

        assert_eq!(reg.images.dist, "public/img");
        assert_eq!(reg.images.sources, ImagePaths::default().sources);
        assert_eq!(reg.css, CssPaths::default());
        assert_eq!(reg.scripts.vendor.len(), 3);
    }

    #[test]
    fn favicon_target_uses_source_file_name() {
        let reg = PathRegistry::default();
        assert_eq!(reg.favicon_target(), PathBuf::from("dist/favicon.ico"));
    }
}
