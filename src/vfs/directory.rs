/*!
 * Directory Archive Backend
 * Presents a host directory as an archive via std::fs
 */

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use super::paths;
use super::traits::Archive;
use super::types::*;

/// Host directory exposed through the archive contract
///
/// Read queries never escape `root`: virtual paths are normalized before
/// they are joined. The write helpers are used by the facade for the
/// save directory only.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Open a host directory; fails if the path is not a directory
    pub fn open<P: Into<PathBuf>>(root: P) -> VfsResult<Self> {
        let root = root.into();
        match fs::metadata(&root) {
            Ok(md) if md.is_dir() => Ok(Self { root }),
            Ok(_) => Err(VfsError::MountFailed(format!(
                "not a directory: {}",
                root.display()
            ))),
            Err(e) => Err(VfsError::from_io(e, format!("open {}", root.display()))),
        }
    }

    /// Resolve a virtual path below the root
    fn resolve(&self, path: &str) -> PathBuf {
        paths::join(&self.root, path)
    }

    /// Convert std::fs::FileType to VFS FileType
    fn convert_file_type(ft: fs::FileType) -> FileType {
        if ft.is_dir() {
            FileType::Directory
        } else if ft.is_symlink() {
            FileType::Symlink
        } else if ft.is_file() {
            FileType::File
        } else {
            FileType::Other
        }
    }

    fn mtime_secs(md: &fs::Metadata) -> u64 {
        md.modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Create a directory and any missing parents
    pub fn create_directory(&self, path: &str) -> VfsResult<()> {
        let full_path = self.resolve(path);
        fs::create_dir_all(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("create_directory {}", path)))
    }

    /// Write or append bytes, returning the number of bytes written
    ///
    /// Parent directories are not created.
    pub fn write(&self, path: &str, data: &[u8], append: bool) -> VfsResult<u64> {
        if paths::normalize(path).is_empty() {
            return Err(VfsError::InvalidPath("cannot write to the root".into()));
        }

        let full_path = self.resolve(path);
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("open for write {}", path)))?;

        file.write_all(data)
            .map_err(|e| VfsError::from_io(e, format!("write {}", path)))?;
        Ok(data.len() as u64)
    }

    /// Remove a file or an empty directory
    pub fn remove(&self, path: &str) -> VfsResult<()> {
        if paths::normalize(path).is_empty() {
            return Err(VfsError::InvalidPath("cannot remove the root".into()));
        }

        let full_path = self.resolve(path);
        let md = fs::symlink_metadata(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("remove {}", path)))?;

        if md.is_dir() {
            fs::remove_dir(&full_path)
        } else {
            fs::remove_file(&full_path)
        }
        .map_err(|e| VfsError::from_io(e, format!("remove {}", path)))
    }
}

impl Archive for DirectoryArchive {
    fn host_path(&self) -> &Path {
        &self.root
    }

    fn exists(&self, path: &str) -> bool {
        fs::symlink_metadata(self.resolve(path)).is_ok()
    }

    fn is_file(&self, path: &str) -> bool {
        fs::metadata(self.resolve(path))
            .map(|md| md.is_file())
            .unwrap_or(false)
    }

    fn is_directory(&self, path: &str) -> bool {
        fs::metadata(self.resolve(path))
            .map(|md| md.is_dir())
            .unwrap_or(false)
    }

    fn size(&self, path: &str) -> VfsResult<u64> {
        fs::metadata(self.resolve(path))
            .map(|md| md.len())
            .map_err(|e| VfsError::from_io(e, format!("size {}", path)))
    }

    fn last_modified(&self, path: &str) -> u64 {
        fs::metadata(self.resolve(path))
            .map(|md| Self::mtime_secs(&md))
            .unwrap_or(0)
    }

    fn metadata(&self, path: &str) -> VfsResult<Metadata> {
        let md = fs::metadata(self.resolve(path))
            .map_err(|e| VfsError::from_io(e, format!("metadata {}", path)))?;
        Ok(Metadata {
            file_type: Self::convert_file_type(md.file_type()),
            size: md.len(),
            modified: Self::mtime_secs(&md),
        })
    }

    fn for_each_entry(&self, path: &str, visit: &mut dyn FnMut(&str)) {
        let entries = match fs::read_dir(self.resolve(path)) {
            Ok(entries) => entries,
            Err(_) => return,
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| match entry.file_name().into_string() {
                Ok(name) => Some(name),
                Err(raw) => {
                    debug!(name = ?raw, root = %self.root.display(), "Skipping non-UTF-8 entry");
                    None
                }
            })
            .collect();
        names.sort_unstable();

        for name in &names {
            visit(name);
        }
    }

    fn read(&self, path: &str) -> VfsResult<Vec<u8>> {
        let full_path = self.resolve(path);
        fs::read(&full_path).map_err(|e| VfsError::from_io(e, format!("read {}", path)))
    }

    fn name(&self) -> &str {
        "directory"
    }
}
