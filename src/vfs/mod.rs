/*!
 * Virtual File System Module
 * Layered archive mounting behind a single namespace
 */

pub mod directory;
pub mod env;
pub mod filesystem;
pub mod mount;
pub mod packed;
pub mod paths;
pub mod traits;
pub mod types;

// Re-exports
pub use directory::DirectoryArchive;
pub use env::{HostEnvironment, StaticEnvironment, SystemEnvironment};
pub use filesystem::Filesystem;
pub use mount::{open_archive, MountInfo, MountTable};
pub use packed::{fuse, PackBuilder, PackedArchive, PackedArchiveIndex};
pub use traits::Archive;
pub use types::{FileType, Metadata, VfsError, VfsResult};
