//! In-memory file trees.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{VfsError, VfsResult};
use crate::fs::{FileEntry, FileSystem, DEFAULT_FILE_MODE};
use crate::path;

/// An ordered, in-memory tree of files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualFileTree {
    entries: BTreeMap<String, FileEntry>,
}

impl VirtualFileTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from `(path, contents)` pairs.
    pub fn from_files<I, P, C>(files: I) -> VfsResult<Self>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<[u8]>,
    {
        let mut tree = Self::new();
        for (file, contents) in files {
            tree.write(file.as_ref(), contents.as_ref())?;
        }
        Ok(tree)
    }

    /// Records a symlink at `link` pointing at `target`.
    pub fn symlink(&mut self, link: &str, target: &str) -> VfsResult<()> {
        self.write_entry(link, FileEntry::symlink(target))
    }

    /// Iterates over all entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a new tree containing the files under `dir`, re-rooted at `dir`.
    pub fn subtree(&self, dir: &str) -> VfsResult<Self> {
        let key = path::normalize(dir)?;
        let entries = self
            .entries
            .iter()
            .filter_map(|(file, entry)| {
                path::strip_dir(file, &key).map(|rest| (rest.to_string(), entry.clone()))
            })
            .collect();
        Ok(Self { entries })
    }

    /// Loads a host directory into a tree.
    ///
    /// Symlinks are not followed; they are recorded as symlink entries so that
    /// they can be resolved later against the host when packing.
    pub fn load_dir(root: &Path) -> VfsResult<Self> {
        let mut tree = Self::new();
        for item in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let item = item.map_err(|e| {
                let at = e.path().unwrap_or(root).to_path_buf();
                VfsError::host(at, e.into())
            })?;
            let rel = match item.path().strip_prefix(root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().replace('\\', "/"),
                _ => continue,
            };
            let file_type = item.file_type();
            if file_type.is_symlink() {
                let target =
                    fs::read_link(item.path()).map_err(|e| VfsError::host(item.path(), e))?;
                tree.symlink(&rel, &target.to_string_lossy())?;
            } else if file_type.is_file() {
                let contents = fs::read(item.path()).map_err(|e| VfsError::host(item.path(), e))?;
                let mode = host_mode(item.path());
                tree.write_entry(
                    &rel,
                    FileEntry {
                        contents,
                        mode,
                        symlink: None,
                    },
                )?;
            }
        }
        Ok(tree)
    }

    /// Writes every regular file of the tree beneath a host directory.
    ///
    /// Symlink entries are skipped.
    pub fn write_to_dir(&self, root: &Path) -> VfsResult<usize> {
        let mut written = 0;
        for (file, entry) in &self.entries {
            if entry.is_symlink() {
                continue;
            }
            let dest = root.join(file);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| VfsError::host(parent, e))?;
            }
            fs::write(&dest, &entry.contents).map_err(|e| VfsError::host(&dest, e))?;
            written += 1;
        }
        Ok(written)
    }
}

impl FileSystem for VirtualFileTree {
    fn entry(&self, path: &str) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    fn put_entry(&mut self, path: String, entry: FileEntry) {
        self.entries.insert(path, entry);
    }

    fn delete_entry(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    fn paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn is_dir(&self, dir: &str) -> bool {
        match path::normalize(dir) {
            Ok(key) if key.is_empty() => true,
            Ok(key) => {
                let prefix = format!("{}/", key);
                self.entries
                    .range(prefix.clone()..)
                    .next()
                    .is_some_and(|(file, _)| file.starts_with(&prefix))
            }
            Err(_) => false,
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(unix)]
fn host_mode(file: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(file)
        .map(|m| m.permissions().mode() & 0o777)
        .unwrap_or(DEFAULT_FILE_MODE)
}

#[cfg(not(unix))]
fn host_mode(_file: &Path) -> u32 {
    DEFAULT_FILE_MODE
}

/// Copies every file under `from` in `src` to `to` in `dst`.
///
/// Returns the number of files copied.
pub fn copy_dir(
    src: &dyn FileSystem,
    from: &str,
    dst: &mut dyn FileSystem,
    to: &str,
) -> VfsResult<usize> {
    let from = path::normalize(from)?;
    let to = path::normalize(to)?;
    let mut copied = 0;
    for file in src.files_under(&from)? {
        let Some(rest) = path::strip_dir(&file, &from) else {
            continue;
        };
        if let Some(entry) = src.entry(&file) {
            dst.put_entry(path::join(&to, rest), entry.clone());
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_and_read() {
        let mut tree = VirtualFileTree::new();
        tree.write("/models/go.mod", b"module x").unwrap();
        assert_eq!(tree.read("models/go.mod").unwrap(), b"module x");
        assert!(tree.is_dir("models"));
        assert!(!tree.is_dir("model"));
        assert!(tree.is_dir(""));
        assert!(tree.read("models/missing").is_err());
    }

    #[test]
    fn test_write_rejects_escape() {
        let mut tree = VirtualFileTree::new();
        assert!(tree.write("../outside", b"x").is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_glob_matches_dirs_and_files() {
        let tree = VirtualFileTree::from_files([
            ("test-foo/main.k", "a"),
            ("test-bar/main.py", "b"),
            ("readme.md", "c"),
            ("nested/test-baz/kcl.mod", "d"),
        ])
        .unwrap();
        assert_eq!(
            tree.glob("*").unwrap(),
            vec!["nested", "readme.md", "test-bar", "test-foo"]
        );
        assert_eq!(tree.glob("nested/*").unwrap(), vec!["nested/test-baz"]);
        assert!(tree.glob("[").is_err());
    }

    #[test]
    fn test_subtree_and_copy_dir() {
        let tree = VirtualFileTree::from_files([
            ("models/a/b.k", "b"),
            ("models/c.k", "c"),
            ("other/d.k", "d"),
        ])
        .unwrap();
        let sub = tree.subtree("models").unwrap();
        assert_eq!(sub.paths(), vec!["a/b.k", "c.k"]);

        let mut dst = VirtualFileTree::new();
        let copied = copy_dir(&tree, "models", &mut dst, "out").unwrap();
        assert_eq!(copied, 2);
        assert_eq!(dst.paths(), vec!["out/a/b.k", "out/c.k"]);
    }

    #[test]
    fn test_remove_dir() {
        let mut tree =
            VirtualFileTree::from_files([("a/x", "1"), ("a/y/z", "2"), ("ab", "3")]).unwrap();
        assert_eq!(tree.remove_dir("a").unwrap(), 2);
        assert_eq!(tree.paths(), vec!["ab"]);
    }

    #[test]
    fn test_load_and_write_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/file.txt"), "hello").unwrap();
        fs::write(dir.path().join("top.yaml"), "kind: X").unwrap();

        let tree = VirtualFileTree::load_dir(dir.path()).unwrap();
        assert_eq!(tree.paths(), vec!["sub/file.txt", "top.yaml"]);

        let out = tempfile::tempdir().unwrap();
        assert_eq!(tree.write_to_dir(out.path()).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(out.path().join("sub/file.txt")).unwrap(),
            "hello"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_load_dir_records_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();

        let tree = VirtualFileTree::load_dir(dir.path()).unwrap();
        assert!(tree.entry("link.txt").unwrap().is_symlink());
        assert!(!tree.entry("real.txt").unwrap().is_symlink());
    }
}
