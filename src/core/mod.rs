/*!
 * Core Module
 * Configuration and shared constants
 */

pub mod config;
pub mod limits;

// Re-export for convenience
pub use config::FilesystemConfig;
