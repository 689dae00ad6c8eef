//! # Path Helpers
//!
//! Project-root discovery (used to anchor the log directory) and the
//! idempotent parent-directory creation every save helper runs first.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable that pins the project root explicitly.
pub const PROJECT_ROOT_ENV: &str = "PIPELINE_PROJECT_ROOT";

/// Files or directories whose presence marks a project root.
pub const ROOT_MARKERS: &[&str] = &[".git", "Cargo.toml", "pyproject.toml", "setup.py"];

/// Resolves the project root.
///
/// `PIPELINE_PROJECT_ROOT` wins when set. Otherwise the current directory and
/// its ancestors are searched for the first one containing a [`ROOT_MARKERS`]
/// entry; if none does, the current directory itself is returned.
pub fn project_root() -> io::Result<PathBuf> {
    if let Some(root) = env::var_os(PROJECT_ROOT_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(root));
    }
    let cwd = env::current_dir()?;
    Ok(find_root_from(&cwd).unwrap_or(cwd))
}

/// Walks up from `start` looking for a root marker.
pub fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ROOT_MARKERS.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}

/// Creates the parent directory of `path` (and its ancestors) if missing.
///
/// A bare file name has no parent to create. Calling this on an existing
/// directory is a no-op.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
