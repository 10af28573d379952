/*!
 * VFS Traits
 * Core archive abstraction shared by every storage backend
 */

use std::path::Path;

use super::types::*;

/// A mounted unit of read-queryable storage
///
/// Virtual paths are archive-relative and `/`-separated; backends
/// normalize them with [`paths::normalize`](super::paths::normalize)
/// before use. A missing entry is an expected outcome: boolean queries
/// answer `false`, `last_modified` answers 0, and the remaining queries
/// return [`VfsError::NotFound`].
pub trait Archive: Send + Sync {
    /// Host path this archive was mounted from (its identity)
    fn host_path(&self) -> &Path;

    /// Check if any entry exists at the path
    fn exists(&self, path: &str) -> bool;

    /// Check if the path is a regular file
    fn is_file(&self, path: &str) -> bool;

    /// Check if the path is a directory
    fn is_directory(&self, path: &str) -> bool;

    /// Byte length of the entry
    fn size(&self, path: &str) -> VfsResult<u64>;

    /// Modification time in seconds since the UNIX epoch, 0 if unknown
    fn last_modified(&self, path: &str) -> u64;

    /// Entry type, size and modification time in one lookup
    fn metadata(&self, path: &str) -> VfsResult<Metadata>;

    /// Visit the names of the direct children of a directory, sorted by name
    fn for_each_entry(&self, path: &str, visit: &mut dyn FnMut(&str));

    /// Read entire file contents
    fn read(&self, path: &str) -> VfsResult<Vec<u8>>;

    /// Get backend name
    fn name(&self) -> &str;

    /// Release backend resources
    ///
    /// Dropping the archive releases the same resources; this exists so
    /// the mount table can log and release in one place.
    fn unmount(self: Box<Self>) {}
}
