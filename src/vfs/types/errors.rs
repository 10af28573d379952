/*!
 * VFS Error Types
 * Structured, type-safe error handling for filesystem operations
 */

use miette::Diagnostic;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// VFS operation result
///
/// # Must Use
/// VFS operations can fail and must be handled to prevent data loss
#[must_use = "VFS operations can fail and must be handled"]
pub type VfsResult<T> = Result<T, VfsError>;

/// VFS errors with structured, type-safe error handling
///
/// All error variants include context strings that should be non-empty.
/// Serialization uses tagged enum pattern for type safety.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum VfsError {
    #[error("Not found: {0}")]
    #[diagnostic(
        code(vfs::not_found),
        help("No mounted archive contains this path. Check the mount order and spelling.")
    )]
    NotFound(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already mounted: {0}")]
    #[diagnostic(
        code(vfs::already_mounted),
        help("Unmount the existing archive before mounting it again.")
    )]
    AlreadyMounted(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Mount failed: {0}")]
    #[diagnostic(
        code(vfs::mount_failed),
        help("The path must be a directory or a packed archive (optionally fused to an executable).")
    )]
    MountFailed(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("No save directory configured")]
    #[diagnostic(
        code(vfs::no_save_directory),
        help("Call set_identity before writing, creating directories or removing files.")
    )]
    NoSaveDirectory,

    #[error("Save directory setup failed: {0}")]
    #[diagnostic(code(vfs::save_directory))]
    SaveDirectory(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Host environment: {0}")]
    #[diagnostic(code(vfs::environment))]
    Environment(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid archive: {0}")]
    #[diagnostic(code(vfs::invalid_archive))]
    InvalidArchive(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Permission denied: {0}")]
    #[diagnostic(code(vfs::permission_denied))]
    PermissionDenied(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Already exists: {0}")]
    #[diagnostic(code(vfs::already_exists))]
    AlreadyExists(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid path: {0}")]
    #[diagnostic(code(vfs::invalid_path))]
    InvalidPath(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(code(vfs::invalid_argument))]
    InvalidArgument(#[serde(deserialize_with = "deserialize_nonempty_string")] String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(vfs::io))]
    IoError(#[serde(deserialize_with = "deserialize_nonempty_string")] String),
}

impl VfsError {
    /// Convert std::io::Error to VfsError, keeping the operation as context
    pub fn from_io(e: std::io::Error, context: impl Into<String>) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::NotFound => VfsError::NotFound(context.into()),
            ErrorKind::PermissionDenied => VfsError::PermissionDenied(context.into()),
            ErrorKind::AlreadyExists => VfsError::AlreadyExists(context.into()),
            _ => VfsError::IoError(format!("{}: {}", context.into(), e)),
        }
    }

    /// True for the "path absent" outcome of read-path queries
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

/// Deserialize and validate non-empty string for error messages
pub(super) fn deserialize_nonempty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        return Err(serde::de::Error::custom("error message must not be empty"));
    }
    Ok(s)
}
