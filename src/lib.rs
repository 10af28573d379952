/*!
 * mountfs Library
 * Virtual filesystem over host directories and packed archives
 */

pub mod core;
pub mod monitoring;
pub mod vfs;

// Re-exports
pub use core::FilesystemConfig;
pub use monitoring::{init_tracing, span_operation};
pub use vfs::{
    fuse, Archive, DirectoryArchive, FileType, Filesystem, HostEnvironment, Metadata, MountInfo,
    PackBuilder, PackedArchive, StaticEnvironment, SystemEnvironment, VfsError, VfsResult,
};
