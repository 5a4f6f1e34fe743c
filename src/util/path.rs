//! Lexical path resolution.

use std::path::{Component, Path, PathBuf};

use crate::error::{BridgeError, BridgeResult};

/// Resolve `path` to an absolute path, defaulting to the current directory.
///
/// Relative paths are joined onto the current directory and `.`/`..`
/// components are folded away without touching the filesystem, so the
/// target does not need to exist. Symlinks are not followed.
pub fn resolve_absolute(path: Option<&str>) -> BridgeResult<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|e| BridgeError::PathResolutionFailed(e.to_string()))?;
    resolve_from(&cwd, path)
}

/// Like [`resolve_absolute`] with an explicit base directory.
pub fn resolve_from(base: &Path, path: Option<&str>) -> BridgeResult<PathBuf> {
    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return Ok(normalize(base));
    };

    if path.contains('\0') {
        return Err(BridgeError::PathResolutionFailed(
            "path contains null byte".to_owned(),
        ));
    }

    let raw = Path::new(path);
    if raw.is_absolute() {
        Ok(normalize(raw))
    } else {
        Ok(normalize(&base.join(raw)))
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `pop` on the root is a no-op, matching `/..` == `/`.
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
