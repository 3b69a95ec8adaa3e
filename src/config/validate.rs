// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use globset::Glob;
use tracing::warn;

use crate::config::model::{parse_browser_version, ConfigFile, RawConfigFile};
use crate::errors::{AssetdagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_patterns(cfg)?;
    validate_destinations(cfg)?;
    validate_images(cfg)?;
    validate_targets(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(AssetdagError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.server.port == 0 {
        return Err(AssetdagError::ConfigError(
            "[server].port must be a fixed port (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    let patterns = [
        &paths.styles.sources,
        &paths.styles.watch,
        &paths.markup.sources,
        &paths.images.sources,
        &paths.images.watch,
    ];
    for pattern in patterns {
        Glob::new(pattern).map_err(|source| AssetdagError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Every directory-valued destination belongs to exactly one task category.
fn validate_destinations(cfg: &RawConfigFile) -> Result<()> {
    let dests = cfg.paths.destination_dirs();

    for (i, (task_a, dir_a)) in dests.iter().enumerate() {
        for (task_b, dir_b) in dests.iter().skip(i + 1) {
            if normalize(dir_a) == normalize(dir_b) {
                return Err(AssetdagError::ConfigError(format!(
                    "tasks '{task_a}' and '{task_b}' both write to '{dir_a}'"
                )));
            }
        }
    }

    let dist_root = normalize(&cfg.paths.dist_root);
    if dist_root.as_os_str().is_empty() {
        return Err(AssetdagError::ConfigError(
            "[paths].dist_root must not be empty or the project root".to_string(),
        ));
    }

    let build_outputs = [
        ("buildImg", cfg.paths.images.dist.as_str()),
        ("favicon", cfg.paths.favicon.dist.as_str()),
        ("minify", cfg.paths.markup.dist.as_str()),
    ];
    for (task, dir) in build_outputs {
        if !normalize(dir).starts_with(&dist_root) {
            warn!(
                task,
                dir,
                dist_root = %cfg.paths.dist_root,
                "build output lives outside dist_root; `clean` will not remove it"
            );
        }
    }

    Ok(())
}

fn validate_images(cfg: &RawConfigFile) -> Result<()> {
    if cfg.images.optimization_level > 7 {
        return Err(AssetdagError::ConfigError(format!(
            "[images].optimization_level must be between 0 and 7 (got {})",
            cfg.images.optimization_level
        )));
    }
    Ok(())
}

fn validate_targets(cfg: &RawConfigFile) -> Result<()> {
    for (browser, version) in cfg.bundle.targets.entries() {
        if parse_browser_version(version).is_none() {
            return Err(AssetdagError::ConfigError(format!(
                "[bundle.targets].{browser} has invalid version '{version}'"
            )));
        }
    }
    Ok(())
}

/// Lexically normalise a relative registry path (`./dist/` == `dist`).
fn normalize(p: &str) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in Path::new(p).components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_dot_segments() {
        assert_eq!(normalize("./dist/"), PathBuf::from("dist"));
        assert_eq!(normalize("src/../dist"), PathBuf::from("dist"));
        assert_eq!(normalize("."), PathBuf::new());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }
}
