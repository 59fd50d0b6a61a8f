//! Path normalization for virtual trees.
//!
//! Every path stored in a tree is relative, uses `/` separators, and never
//! contains `.`, `..`, or empty segments.

use crate::error::{VfsError, VfsResult};

/// Normalizes `path` into the canonical form used as a tree key.
///
/// Leading `/` and `./` are stripped and `..` segments are resolved. A path
/// whose `..` segments would climb above the root is rejected. The empty
/// string denotes the root itself.
pub fn normalize(path: &str) -> VfsResult<String> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(VfsError::invalid_path(path, "escapes the tree root"));
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Normalizes a path that must name a file (i.e. not the root).
pub fn normalize_file(path: &str) -> VfsResult<String> {
    let normalized = normalize(path)?;
    if normalized.is_empty() {
        return Err(VfsError::invalid_path(path, "refers to the tree root"));
    }
    Ok(normalized)
}

/// Joins two normalized paths.
pub fn join(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base, rest),
    }
}

/// Returns the parent directory of a normalized path (`""` for top-level entries).
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Returns the final segment of a normalized path.
pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// Strips a directory prefix from a normalized path.
///
/// Returns `None` when `path` does not live under `dir`.
pub fn strip_dir<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    if dir.is_empty() {
        return Some(path);
    }
    path.strip_prefix(dir)?.strip_prefix('/')
}

/// Yields every ancestor directory of a normalized file path, outermost first.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(idx, _)| &path[..idx])
}
