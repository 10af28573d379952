/*!
 * Filesystem Limits and Constants
 *
 * Centralized location for format constants and host limits.
 * Organized by domain for maintainability and discoverability.
 */

// =============================================================================
// PACKED ARCHIVE FORMAT
// =============================================================================

/// Size of one archive record (header or data block)
pub const BLOCK_SIZE: u64 = 512;

/// Number of zero records written after the last entry
pub const END_RECORDS: u64 = 2;

/// Magic tag identifying an archive appended to an executable
pub const TRAILER_MAGIC: [u8; 4] = *b"TAR\0";

/// Length of the fused-executable trailer (magic + offset)
pub const TRAILER_LEN: u64 = 8;

/// Longest name that fits the header name field
pub const HEADER_NAME_LEN: usize = 100;

/// Longest prefix that fits the ustar prefix field
pub const HEADER_PREFIX_LEN: usize = 155;

/// Largest accepted GNU long-name record (bytes)
pub const MAX_LONG_NAME_LEN: u64 = 64 * 1024;

// =============================================================================
// HOST LIMITS
// =============================================================================

/// Maximum composed host path length (bytes)
/// Applies to the save directory derived from the identity
pub const DEFAULT_MAX_PATH_LEN: usize = 1024;

/// Default application namespace under the app-data root
pub const DEFAULT_NAMESPACE: &str = "mountfs";

/// Default module search patterns (`?` is replaced by the module path)
pub const DEFAULT_MODULE_PATTERNS: [&str; 2] = ["?.lua", "?/init.lua"];

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Overrides the application namespace
pub const ENV_NAMESPACE: &str = "MOUNTFS_NAMESPACE";

/// Overrides the host app-data root
pub const ENV_APPDATA_DIR: &str = "MOUNTFS_APPDATA_DIR";

/// Enables JSON log output when `1` or `true`
pub const ENV_TRACE_JSON: &str = "MOUNTFS_TRACE_JSON";
