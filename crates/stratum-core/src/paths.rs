//! Lexical path helpers shared by the loader and the glob matcher
//!
//! Nothing in here touches the file system: resolution must stay free of I/O
//! once layers are loaded.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, folding `.` and `..` components.
///
/// Leading `..` components of a relative path are kept since there is nothing
/// to fold them into.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out.iter().collect()
}

/// Express `path` relative to `base` as a `/`-separated string.
///
/// Returns `None` when the path lies outside `base`.
pub fn relative_to(path: &Path, base: &Path) -> Option<String> {
    let path = normalize(path);
    let base = normalize(base);
    let rest = path.strip_prefix(&base).ok()?;

    let mut parts = Vec::new();
    for component in rest.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    Some(parts.join("/"))
}
