//! Processor configuration.
//!
//! Reads `tessera.config.json` from a directory. Missing files and unreadable
//! files fall back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "tessera.config.json";

/// Model key the resource content map is written under by default.
pub const DEFAULT_RESOURCE_CONTENT_KEY: &str = "content";

/// Property-name prefixes of repository-internal properties.
pub const DEFAULT_RESERVED_PREFIXES: &[&str] = &["jcr:", "j:", "rep:", "mix:", "nt:"];

/// Configuration shared by the built-in context processors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorConfig {
    /// Model path the resource content map is written to.
    pub resource_content_key: String,

    /// Properties whose names start with any of these are never copied into
    /// the model.
    pub reserved_prefixes: Vec<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            resource_content_key: DEFAULT_RESOURCE_CONTENT_KEY.to_string(),
            reserved_prefixes: DEFAULT_RESERVED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl ProcessorConfig {
    /// Whether `name` is an internal property name.
    #[inline]
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }
}

/// Load `tessera.config.json` from the given directory (or CWD if None).
pub fn load_config(dir: Option<&Path>) -> ProcessorConfig {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config_path = base.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        return ProcessorConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("failed to parse {}: {}", config_path.display(), e);
                ProcessorConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("failed to read {}: {}", config_path.display(), e);
            ProcessorConfig::default()
        }
    }
}
