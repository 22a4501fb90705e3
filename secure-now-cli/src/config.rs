use std::path::{Path, PathBuf};

use secure_now_engine::DEFAULT_PREFIX;
use serde::Deserialize;

use crate::error::AppError;

/// Settings read from the optional TOML configuration file.
///
/// ```toml
/// cache_dir = "node_modules/.vite/traefik.me"
/// timeout = "30s"
/// proxy = "socks5://127.0.0.1:1080"
/// colors = false
///
/// [plugin]
/// prefix = "shop"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub cache_dir: Option<PathBuf>,
    pub timeout: Option<String>,
    pub proxy: Option<String>,
    pub colors: Option<bool>,
    pub plugin: PluginConfig,
}

/// The `[plugin]` table. Only the serving domain matters outside a host, so
/// the per-server HTTPS switches are not accepted here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginConfig {
    pub prefix: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_owned(),
        }
    }
}

impl FileConfig {
    /// Load the configuration file; a missing path yields the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
