/*!
 * Virtual Filesystem
 * Unified read/write facade over the mount table and save directory
 */

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::directory::DirectoryArchive;
use super::env::{HostEnvironment, SystemEnvironment};
use super::mount::{open_archive, MountInfo, MountTable};
use super::packed::PackBuilder;
use super::paths;
use super::traits::Archive;
use super::types::*;
use crate::core::FilesystemConfig;

/// Filesystem instance owned by the embedding application
///
/// Reads consult mounts in precedence order and the first archive that
/// answers wins. Writes go to the save directory only, which is mounted
/// at the front once an identity is set.
pub struct Filesystem {
    config: FilesystemConfig,
    env: Box<dyn HostEnvironment>,
    mounts: MountTable,
    save: Option<DirectoryArchive>,
    identity: Option<String>,
    source: Option<PathBuf>,
    fused: bool,
}

impl Filesystem {
    /// Create an empty filesystem; call [`init`](Self::init) to mount the source
    pub fn new<E: HostEnvironment + 'static>(config: FilesystemConfig, env: E) -> Self {
        Self {
            config,
            env: Box::new(env),
            mounts: MountTable::new(),
            save: None,
            identity: None,
            source: None,
            fused: false,
        }
    }

    /// Filesystem using environment overrides and the running process
    pub fn system() -> Self {
        Self::new(FilesystemConfig::from_env(), SystemEnvironment)
    }

    /// Mount the application source
    ///
    /// The running executable is tried first so a fused build finds its own
    /// data. Otherwise `source_hint` is mounted. When neither works the
    /// filesystem stays empty and no source is recorded.
    pub fn init(&mut self, source_hint: Option<&Path>) {
        self.shutdown();

        match self.env.executable_path() {
            Ok(exe) => match open_archive(&exe).and_then(|a| self.mounts.insert(a, true)) {
                Ok(()) => {
                    info!(executable = %exe.display(), "Running fused executable");
                    self.fused = true;
                    self.source = Some(exe);
                    return;
                }
                Err(e) => debug!(executable = %exe.display(), error = %e, "Executable is not fused"),
            },
            Err(e) => debug!(error = %e, "Executable path unavailable"),
        }

        let Some(hint) = source_hint else {
            info!("No source given, starting with an empty filesystem");
            return;
        };

        let source = std::fs::canonicalize(hint).unwrap_or_else(|_| hint.to_path_buf());
        match self.mount(&source, true) {
            Ok(()) => {
                info!(source = %source.display(), "Mounted source");
                self.source = Some(source);
            }
            Err(e) => warn!(source = %source.display(), error = %e, "Failed to mount source"),
        }
    }

    /// Unmount everything and forget identity, save directory and source
    pub fn shutdown(&mut self) {
        if !self.mounts.is_empty() {
            debug!(mounts = self.mounts.len(), "Shutting down filesystem");
        }
        self.mounts.clear();
        self.save = None;
        self.identity = None;
        self.source = None;
        self.fused = false;
    }

    /// Mount a directory or packed archive at the back (`append`) or front
    pub fn mount<P: AsRef<Path>>(&mut self, host: P, append: bool) -> VfsResult<()> {
        let host = host.as_ref();
        if self.mounts.contains(host) {
            return Err(VfsError::AlreadyMounted(host.display().to_string()));
        }
        let archive = open_archive(host)?;
        self.mounts.insert(archive, append)
    }

    /// Unmount by host path; false if nothing was mounted there
    pub fn unmount<P: AsRef<Path>>(&mut self, host: P) -> bool {
        let host = host.as_ref();
        match self.mounts.remove(host) {
            Some(archive) => {
                if self
                    .save
                    .as_ref()
                    .is_some_and(|save| save.host_path() == archive.host_path())
                {
                    warn!(path = %host.display(), "Save directory unmounted, writes disabled");
                    self.save = None;
                }
                archive.unmount();
                true
            }
            None => false,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.mounts.iter().any(|a| a.exists(path))
    }

    pub fn is_file(&self, path: &str) -> bool {
        self.mounts.iter().any(|a| a.is_file(path))
    }

    pub fn is_directory(&self, path: &str) -> bool {
        self.mounts.iter().any(|a| a.is_directory(path))
    }

    /// Size from the first mount that knows the path
    pub fn size(&self, path: &str) -> VfsResult<u64> {
        self.first_ok(path, |a| a.size(path))
    }

    /// First nonzero modification time, 0 if no mount knows one
    pub fn last_modified(&self, path: &str) -> u64 {
        self.mounts
            .iter()
            .map(|a| a.last_modified(path))
            .find(|&t| t != 0)
            .unwrap_or(0)
    }

    pub fn metadata(&self, path: &str) -> VfsResult<Metadata> {
        self.first_ok(path, |a| a.metadata(path))
    }

    /// Host path of the mount that serves `path`
    pub fn real_directory(&self, path: &str) -> Option<&Path> {
        self.mounts.first_match(path).map(|a| a.host_path())
    }

    /// Whole-file read from the first mount that can serve it
    pub fn read(&self, path: &str) -> VfsResult<Vec<u8>> {
        self.first_ok(path, |a| a.read(path))
    }

    fn first_ok<T>(
        &self,
        path: &str,
        mut query: impl FnMut(&dyn Archive) -> VfsResult<T>,
    ) -> VfsResult<T> {
        for archive in self.mounts.iter() {
            if let Ok(value) = query(archive) {
                return Ok(value);
            }
        }
        Err(VfsError::NotFound(path.to_string()))
    }

    /// Visit child names of `path` across every mount
    ///
    /// Each mount reports its own children in name order; names present in
    /// several mounts are reported once per mount.
    pub fn for_each_item<F: FnMut(&str)>(&self, path: &str, mut visit: F) {
        for archive in self.mounts.iter() {
            archive.for_each_entry(path, &mut visit);
        }
    }

    /// Collect [`for_each_item`](Self::for_each_item) into a list
    pub fn directory_items(&self, path: &str) -> Vec<String> {
        let mut items = Vec::new();
        self.for_each_item(path, |name| items.push(name.to_string()));
        items
    }

    /// Pack the merged tree below `path` as the mounts present it
    ///
    /// Shadowed entries are written once, with the content `read` returns.
    /// Returns the number of entries written.
    pub fn export<W: Write>(&self, path: &str, builder: &mut PackBuilder<W>) -> VfsResult<usize> {
        let mut names = self.directory_items(path);
        names.sort_unstable();
        names.dedup();

        let base = paths::normalize(path);
        let mut written = 0;
        for name in names {
            let child = if base.is_empty() {
                name
            } else {
                format!("{}/{}", base, name)
            };
            let mtime = self.last_modified(&child);

            if self.is_directory(&child) {
                builder.append_dir(&child, mtime)?;
                written += 1 + self.export(&child, builder)?;
            } else if self.is_file(&child) {
                builder.append_file(&child, &self.read(&child)?, mtime)?;
                written += 1;
            }
        }
        Ok(written)
    }

    fn save_dir(&self) -> VfsResult<&DirectoryArchive> {
        self.save.as_ref().ok_or(VfsError::NoSaveDirectory)
    }

    /// Write to the save directory, returning the bytes written
    pub fn write(&self, path: &str, data: &[u8], append: bool) -> VfsResult<u64> {
        let written = self.save_dir()?.write(path, data, append)?;
        debug!(path = %path, bytes = written, append = append, "Wrote file");
        Ok(written)
    }

    pub fn append(&self, path: &str, data: &[u8]) -> VfsResult<u64> {
        self.write(path, data, true)
    }

    /// Create a directory and its parents in the save directory
    pub fn create_directory(&self, path: &str) -> VfsResult<()> {
        self.save_dir()?.create_directory(path)
    }

    /// Remove a file or empty directory from the save directory
    pub fn remove(&self, path: &str) -> VfsResult<()> {
        self.save_dir()?.remove(path)
    }

    /// Select the save directory `<app data>/<namespace>/<name>`
    ///
    /// The directory is created if needed and mounted ahead of every other
    /// archive. A previous save directory is unmounted first; on failure
    /// no save directory remains configured.
    pub fn set_identity(&mut self, name: &str) -> VfsResult<()> {
        Self::validate_identity(name)?;

        if let Some(previous) = self.save.take() {
            if let Some(archive) = self.mounts.remove(previous.host_path()) {
                archive.unmount();
            }
            debug!(path = %previous.host_path().display(), "Released previous save directory");
        }
        self.identity = None;

        let root = match &self.config.app_data_dir {
            Some(dir) => dir.clone(),
            None => self
                .env
                .app_data_dir()
                .map_err(|e| VfsError::SaveDirectory(e.to_string()))?,
        };
        let dir = root.join(&self.config.namespace).join(name);

        let len = dir.as_os_str().len();
        if len > self.config.max_path_len {
            return Err(VfsError::SaveDirectory(format!(
                "path too long ({} > {}): {}",
                len,
                self.config.max_path_len,
                dir.display()
            )));
        }

        std::fs::create_dir_all(&dir).map_err(|e| {
            VfsError::SaveDirectory(format!("create {}: {}", dir.display(), e))
        })?;
        let archive =
            DirectoryArchive::open(&dir).map_err(|e| VfsError::SaveDirectory(e.to_string()))?;
        self.mounts
            .insert(Box::new(archive.clone()), false)
            .map_err(|e| VfsError::SaveDirectory(e.to_string()))?;

        info!(identity = %name, path = %dir.display(), "Save directory ready");
        self.save = Some(archive);
        self.identity = Some(name.to_string());
        Ok(())
    }

    fn validate_identity(name: &str) -> VfsResult<()> {
        if name.is_empty() {
            return Err(VfsError::InvalidPath("identity must not be empty".into()));
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(VfsError::InvalidPath(format!(
                "identity must be a single path component: {}",
                name
            )));
        }
        Ok(())
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn save_directory(&self) -> Option<&Path> {
        self.save.as_ref().map(|s| s.host_path())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_fused(&self) -> bool {
        self.fused
    }

    /// Mounts in precedence order
    pub fn mounts(&self) -> Vec<MountInfo> {
        self.mounts.list_mounts()
    }

    pub fn config(&self) -> &FilesystemConfig {
        &self.config
    }

    pub fn executable_path(&self) -> VfsResult<PathBuf> {
        self.env.executable_path()
    }

    pub fn app_data_directory(&self) -> VfsResult<PathBuf> {
        match &self.config.app_data_dir {
            Some(dir) => Ok(dir.clone()),
            None => self.env.app_data_dir(),
        }
    }

    /// Resolve a dotted module name against the configured patterns
    ///
    /// `a.b` becomes `a/b`, then each `?` in a pattern is replaced by it.
    /// The first candidate that is a file in any mount wins.
    pub fn find_module(&self, name: &str) -> Option<String> {
        let base = name.replace('.', "/");
        self.config
            .module_patterns
            .iter()
            .map(|pattern| pattern.replace('?', &base))
            .find(|candidate| self.is_file(candidate))
    }

    /// Resolve and read a module, returning its virtual path and bytes
    pub fn load_module(&self, name: &str) -> VfsResult<(String, Vec<u8>)> {
        let path = self
            .find_module(name)
            .ok_or_else(|| VfsError::NotFound(format!("module {}", name)))?;
        let data = self.read(&path)?;
        Ok((path, data))
    }
}

impl Drop for Filesystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}
