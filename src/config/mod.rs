// src/config/mod.rs

//! Configuration loading and validation for assetdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`) and the path registry
//!   (`registry.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate registry invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod registry;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{
    BrowserTargets, BundleSection, ConfigFile, ConfigSection, ImagesSection, RawConfigFile,
    ServerSection, StyleOutput, StylesSection,
};
pub use registry::PathRegistry;
