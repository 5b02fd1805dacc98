//! Request input validation.

use std::path::{Component, Path, PathBuf};

/// Resolve a client-supplied filename under `root`.
///
/// Only plain relative paths are accepted: no absolute paths, no `..`,
/// no NUL bytes. Subdirectories are allowed.
pub fn resolve_video_path(root: &Path, filename: &str) -> Option<PathBuf> {
    if filename.is_empty() || filename.len() > 1024 || filename.contains('\0') {
        return None;
    }

    let relative = Path::new(filename);
    let mut saw_normal = false;
    for component in relative.components() {
        match component {
            Component::Normal(_) => saw_normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    saw_normal.then(|| root.join(relative))
}
