use assetdag::config::{ConfigFile, RawConfigFile};
use assetdag::types::CacheStorageMode;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults; each method overrides one setting.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn memory_cache(mut self) -> Self {
        self.config.config.cache_storage = CacheStorageMode::Memory;
        self
    }

    pub fn minify_html(mut self, val: bool) -> Self {
        self.config.bundle.minify_html = val;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
