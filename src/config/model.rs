// src/config/model.rs

use serde::Deserialize;

use crate::config::registry::PathRegistry;
use crate::types::{CacheStorageMode, TriggerWhileRunningBehaviour};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// triggered_while_running_behaviour = "queue"
/// queue_length = 1
/// cache_storage = "file"
///
/// [paths.css]
/// app = "src/css"
///
/// [server]
/// port = 3000
///
/// [images]
/// optimization_level = 5
///
/// [bundle.targets]
/// safari = "13"
/// ```
///
/// All sections are optional and have reasonable defaults. This is the raw,
/// unvalidated form; use [`ConfigFile`] everywhere else.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub paths: PathRegistry,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub styles: StylesSection,

    #[serde(default)]
    pub images: ImagesSection,

    #[serde(default)]
    pub bundle: BundleSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holding one means the registry invariants hold.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub paths: PathRegistry,
    pub server: ServerSection,
    pub styles: StylesSection,
    pub images: ImagesSection,
    pub bundle: BundleSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            paths: raw.paths,
            server: raw.server,
            styles: raw.styles,
            images: raw.images,
            bundle: raw.bundle,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[config]` section: watch runtime and cache behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// `"queue"` or `"overlap"`.
    #[serde(default)]
    pub triggered_while_running_behaviour: TriggerWhileRunningBehaviour,

    /// Maximum number of pending reruns remembered per watch binding.
    #[serde(default = "default_queue_length")]
    pub queue_length: usize,

    /// `"file"` or `"memory"`.
    #[serde(default)]
    pub cache_storage: CacheStorageMode,
}

fn default_queue_length() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            triggered_while_running_behaviour: TriggerWhileRunningBehaviour::default(),
            queue_length: default_queue_length(),
            cache_storage: CacheStorageMode::default(),
        }
    }
}

/// `[server]` section for the dev server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Directory served as the site root.
    pub base_dir: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_dir: "src".to_string(),
        }
    }
}

/// Output style of the style compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleOutput {
    #[default]
    Expanded,
    Compressed,
}

/// `[styles]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StylesSection {
    pub output_style: StyleOutput,
    /// Extra directories searched by `@use` / `@import`.
    pub load_paths: Vec<String>,
}

/// `[images]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ImagesSection {
    /// PNG optimization level, 0 (fastest) to 7 (smallest).
    pub optimization_level: u8,
    /// Drop the SVG `viewBox` attribute when it matches width/height.
    pub remove_view_box: bool,
    /// Unwrap `<g>` elements that carry no attributes.
    pub collapse_groups: bool,
    /// Remove EXIF/XMP/comment segments from JPEG files.
    pub strip_jpeg_metadata: bool,
}

impl Default for ImagesSection {
    fn default() -> Self {
        Self {
            optimization_level: 5,
            remove_view_box: false,
            collapse_groups: true,
            strip_jpeg_metadata: true,
        }
    }
}

/// `[bundle]` section for the markup bundler.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BundleSection {
    pub minify_html: bool,
    /// Browser versions used when adding vendor prefixes.
    pub targets: BrowserTargets,
}

impl Default for BundleSection {
    fn default() -> Self {
        Self {
            minify_html: true,
            targets: BrowserTargets::default(),
        }
    }
}

/// Minimum browser versions (`"major[.minor[.patch]]"`) to prefix for.
/// `None` means the browser is not targeted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowserTargets {
    pub android: Option<String>,
    pub chrome: Option<String>,
    pub edge: Option<String>,
    pub firefox: Option<String>,
    pub ie: Option<String>,
    pub ios_saf: Option<String>,
    pub opera: Option<String>,
    pub safari: Option<String>,
    pub samsung: Option<String>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        Self {
            android: None,
            chrome: Some("80".to_string()),
            edge: Some("88".to_string()),
            firefox: Some("78".to_string()),
            ie: None,
            ios_saf: Some("13".to_string()),
            opera: None,
            safari: Some("13".to_string()),
            samsung: Some("12".to_string()),
        }
    }
}

impl BrowserTargets {
    /// All configured entries as `(browser, version)` pairs.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("android", &self.android),
            ("chrome", &self.chrome),
            ("edge", &self.edge),
            ("firefox", &self.firefox),
            ("ie", &self.ie),
            ("ios_saf", &self.ios_saf),
            ("opera", &self.opera),
            ("safari", &self.safari),
            ("samsung", &self.samsung),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.as_deref().map(|v| (name, v)))
        .collect()
    }
}

/// Parse `"major[.minor[.patch]]"` into the packed `major << 16 | minor << 8 | patch`
/// form used by the CSS prefixer.
pub fn parse_browser_version(s: &str) -> Option<u32> {
    let mut parts = s.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().map(str::parse::<u32>).transpose().ok()?.unwrap_or(0);
    let patch: u32 = parts.next().map(str::parse::<u32>).transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() || minor > 255 || patch > 255 {
        return None;
    }
    Some((major << 16) | (minor << 8) | patch)
}
