/*!
 * Path Utilities
 * Virtual path normalization and host path joining
 */

use path_clean::PathClean;
use std::path::{Path, PathBuf};

/// Normalize a virtual path
///
/// Backslashes become `/`, empty and `.` components are dropped and `..`
/// pops a component without ever escaping the archive root. The result has
/// no leading or trailing slash; the empty string is the root.
pub fn normalize(path: &str) -> String {
    let mut components: Vec<&str> = Vec::with_capacity(8);

    for component in path.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            name => components.push(name),
        }
    }

    components.join("/")
}

/// Map a virtual path below a host root
pub fn join(root: &Path, path: &str) -> PathBuf {
    let normalized = normalize(path);
    if normalized.is_empty() {
        root.to_path_buf()
    } else {
        root.join(normalized)
    }
}

/// Directory part of a normalized virtual path (`""` for top-level entries)
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Last component of a normalized virtual path
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Lexically cleaned host path used as a mount identity
///
/// Backslashes are treated as separators so identities compare equal
/// regardless of the separator the host handed us.
pub fn host_identity(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    if text.contains('\\') {
        PathBuf::from(text.replace('\\', "/")).clean()
    } else {
        path.clean()
    }
}
