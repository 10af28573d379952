/*!
 * Mount Table
 * Ordered archive list with first-match query routing
 */

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::directory::DirectoryArchive;
use super::packed::PackedArchive;
use super::paths;
use super::traits::Archive;
use super::types::*;

/// Open whatever kind of archive lives at a host path
///
/// Directories win; anything else is tried as a packed archive.
pub fn open_archive(host: &Path) -> VfsResult<Box<dyn Archive>> {
    if let Ok(dir) = DirectoryArchive::open(host) {
        return Ok(Box::new(dir));
    }

    match PackedArchive::open(host) {
        Ok(packed) => Ok(Box::new(packed)),
        Err(e) => {
            debug!(path = %host.display(), error = %e, "No backend accepted path");
            Err(VfsError::MountFailed(format!(
                "unrecognized archive: {}",
                host.display()
            )))
        }
    }
}

/// Mount description for listings
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MountInfo {
    pub path: PathBuf,
    pub backend: String,
}

/// Ordered collection of mounted archives
///
/// Earlier entries shadow later ones. Each host path appears at most
/// once, compared after lexical cleanup.
#[derive(Default)]
pub struct MountTable {
    archives: Vec<Box<dyn Archive>>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, host: &Path) -> Option<usize> {
        let identity = paths::host_identity(host);
        self.archives
            .iter()
            .position(|a| paths::host_identity(a.host_path()) == identity)
    }

    /// Check if a host path is already mounted
    pub fn contains(&self, host: &Path) -> bool {
        self.position(host).is_some()
    }

    /// Add an archive at the back (`append`) or the front of the order
    pub fn insert(&mut self, archive: Box<dyn Archive>, append: bool) -> VfsResult<()> {
        if self.contains(archive.host_path()) {
            return Err(VfsError::AlreadyMounted(
                archive.host_path().display().to_string(),
            ));
        }

        info!(
            path = %archive.host_path().display(),
            backend = archive.name(),
            append = append,
            "Mounted archive"
        );
        if append {
            self.archives.push(archive);
        } else {
            self.archives.insert(0, archive);
        }
        Ok(())
    }

    /// Detach the archive mounted from `host`
    pub fn remove(&mut self, host: &Path) -> Option<Box<dyn Archive>> {
        let index = self.position(host)?;
        let archive = self.archives.remove(index);
        info!(path = %archive.host_path().display(), "Unmounted archive");
        Some(archive)
    }

    /// Archives in query order
    pub fn iter(&self) -> impl Iterator<Item = &dyn Archive> {
        self.archives.iter().map(|a| a.as_ref())
    }

    /// First archive in order that contains `path`
    pub fn first_match(&self, path: &str) -> Option<&dyn Archive> {
        self.iter().find(|a| a.exists(path))
    }

    /// Describe mounts in query order
    pub fn list_mounts(&self) -> Vec<MountInfo> {
        self.iter()
            .map(|a| MountInfo {
                path: a.host_path().to_path_buf(),
                backend: a.name().to_string(),
            })
            .collect()
    }

    /// Unmount everything, front to back
    pub fn clear(&mut self) {
        for archive in self.archives.drain(..) {
            debug!(path = %archive.host_path().display(), "Releasing archive");
            archive.unmount();
        }
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }
}

impl Drop for MountTable {
    fn drop(&mut self) {
        self.clear();
    }
}
