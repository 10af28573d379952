/*!
 * Host Environment
 * Executable path and application-data lookups supplied to the filesystem
 */

use std::path::PathBuf;

use super::types::{VfsError, VfsResult};

/// Platform lookups the filesystem depends on
pub trait HostEnvironment: Send + Sync {
    /// Path of the running executable
    fn executable_path(&self) -> VfsResult<PathBuf>;

    /// Per-user application data root
    fn app_data_dir(&self) -> VfsResult<PathBuf>;
}

/// Lookups backed by the running process and the platform data directory
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl HostEnvironment for SystemEnvironment {
    fn executable_path(&self) -> VfsResult<PathBuf> {
        std::env::current_exe()
            .map_err(|e| VfsError::Environment(format!("executable path: {}", e)))
    }

    fn app_data_dir(&self) -> VfsResult<PathBuf> {
        dirs::data_dir().ok_or_else(|| {
            VfsError::Environment("no application data directory for this platform".into())
        })
    }
}

/// Fixed paths chosen by the embedder
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub executable: Option<PathBuf>,
    pub app_data: Option<PathBuf>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn with_app_data<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.app_data = Some(path.into());
        self
    }
}

impl HostEnvironment for StaticEnvironment {
    fn executable_path(&self) -> VfsResult<PathBuf> {
        self.executable
            .clone()
            .ok_or_else(|| VfsError::Environment("executable path not configured".into()))
    }

    fn app_data_dir(&self) -> VfsResult<PathBuf> {
        self.app_data
            .clone()
            .ok_or_else(|| VfsError::Environment("app data directory not configured".into()))
    }
}
