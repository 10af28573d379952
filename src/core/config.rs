/*!
 * Filesystem Configuration
 * Defaults, environment overrides and JSON loading
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::limits::{
    DEFAULT_MAX_PATH_LEN, DEFAULT_MODULE_PATTERNS, DEFAULT_NAMESPACE, ENV_APPDATA_DIR,
    ENV_NAMESPACE,
};
use crate::vfs::types::{VfsError, VfsResult};

/// Configuration for a [`Filesystem`](crate::vfs::Filesystem) instance
///
/// Every field has a default, so a partial JSON document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct FilesystemConfig {
    /// Directory segment between the app-data root and the identity
    pub namespace: String,

    /// Replaces the host app-data root when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_data_dir: Option<PathBuf>,

    /// Search patterns used by module resolution
    pub module_patterns: Vec<String>,

    /// Longest save directory path accepted by `set_identity`
    pub max_path_len: usize,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            app_data_dir: None,
            module_patterns: DEFAULT_MODULE_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            max_path_len: DEFAULT_MAX_PATH_LEN,
        }
    }
}

impl FilesystemConfig {
    /// Defaults overlaid with `MOUNTFS_NAMESPACE` and `MOUNTFS_APPDATA_DIR`
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of this configuration
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(namespace) = std::env::var(ENV_NAMESPACE) {
            if !namespace.is_empty() {
                self.namespace = namespace;
            }
        }
        if let Ok(dir) = std::env::var(ENV_APPDATA_DIR) {
            if !dir.is_empty() {
                self.app_data_dir = Some(PathBuf::from(dir));
            }
        }
        self
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> VfsResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            VfsError::IoError(format!("read config {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            VfsError::InvalidArgument(format!("parse config {}: {}", path.display(), e))
        })
    }

    /// Builder-style namespace override
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Builder-style app-data root override
    pub fn with_app_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.app_data_dir = Some(dir.into());
        self
    }
}
