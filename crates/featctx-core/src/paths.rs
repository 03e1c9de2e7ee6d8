//! Path identity helpers.

use std::path::{Component, Path, PathBuf};

/// Canonical identity of a file on disk.
///
/// Uses `fs::canonicalize` when the file exists; otherwise falls back to a
/// lexically normalized absolute path so that identities stay comparable.
pub fn canonical(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    normalize(&absolute)
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether `path` lies inside `dir` (both compared canonically).
pub fn is_within(path: &Path, dir: &Path) -> bool {
    canonical(path).starts_with(canonical(dir))
}
