/*!
 * VFS Types
 * Shared types for filesystem operations with modern serde patterns
 */

mod errors;
mod file_type;
mod metadata;

pub use errors::{VfsError, VfsResult};
pub use file_type::FileType;
pub use metadata::Metadata;
