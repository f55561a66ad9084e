//! Engine configuration.

use std::path::PathBuf;

use serde::Deserialize;

pub(crate) const DEFAULT_MAX_PATH_BYTES: usize = 255;
pub(crate) const DEFAULT_SERVER_NAME: &str = "localhost";
pub(crate) const DEFAULT_URL_PATTERN: &str = "^/$";

/// Cache engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Base directory holding the `fresh/` and `stale/` trees. Required.
    pub root_directory: PathBuf,
    /// Byte bound on mapped absolute filenames; longer paths are not
    /// cached.
    pub max_path_bytes: usize,
    /// Host name handed to render collaborators that simulate a request.
    pub server_name: String,
    /// Patterns for request paths that should be cached.
    pub urls: Vec<String>,
    /// Patterns for request paths that must never be cached.
    pub exclude_urls: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root_directory: PathBuf::new(),
            max_path_bytes: DEFAULT_MAX_PATH_BYTES,
            server_name: DEFAULT_SERVER_NAME.to_string(),
            urls: vec![DEFAULT_URL_PATTERN.to_string()],
            exclude_urls: Vec::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            root_directory: settings.root_directory.clone(),
            max_path_bytes: settings.max_path_bytes,
            server_name: settings.server_name.clone(),
            urls: settings.urls.clone(),
            exclude_urls: settings.exclude_urls.clone(),
        }
    }
}
