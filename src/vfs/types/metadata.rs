/*!
 * VFS Metadata
 * Entry type, size and modification time as seen through an archive
 */

use super::file_type::FileType;
use serde::{Deserialize, Serialize};

/// Entry metadata
///
/// `modified` is whole seconds since the UNIX epoch; 0 means unknown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct Metadata {
    pub file_type: FileType,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: u64,
}

impl Metadata {
    /// Check if this is a directory
    #[inline(always)]
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.file_type, FileType::Directory)
    }

    /// Check if this is a regular file
    #[inline(always)]
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.file_type, FileType::File)
    }
}
