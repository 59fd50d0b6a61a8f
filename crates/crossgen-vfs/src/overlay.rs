//! Copy-on-write views over a shared tree.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::fs::{FileEntry, FileSystem};
use crate::tree::VirtualFileTree;

/// A writable view over a read-only base tree.
///
/// Writes land in an upper layer and removals are recorded as whiteouts, so
/// the base is never mutated and can be shared by any number of overlays.
#[derive(Debug, Clone)]
pub struct Overlay {
    base: Arc<VirtualFileTree>,
    upper: BTreeMap<String, FileEntry>,
    whiteouts: BTreeSet<String>,
}

impl Overlay {
    /// Creates an overlay over `base`.
    pub fn new(base: Arc<VirtualFileTree>) -> Self {
        Self {
            base,
            upper: BTreeMap::new(),
            whiteouts: BTreeSet::new(),
        }
    }

    /// Returns the shared base tree.
    pub fn base(&self) -> &Arc<VirtualFileTree> {
        &self.base
    }

    /// Materializes the merged view into a standalone tree.
    pub fn flatten(&self) -> VirtualFileTree {
        let mut tree = VirtualFileTree::new();
        for file in self.paths() {
            if let Some(entry) = self.entry(&file) {
                tree.put_entry(file, entry.clone());
            }
        }
        tree
    }
}

impl FileSystem for Overlay {
    fn entry(&self, path: &str) -> Option<&FileEntry> {
        if let Some(entry) = self.upper.get(path) {
            return Some(entry);
        }
        if self.whiteouts.contains(path) {
            return None;
        }
        self.base.entry(path)
    }

    fn put_entry(&mut self, path: String, entry: FileEntry) {
        self.whiteouts.remove(&path);
        self.upper.insert(path, entry);
    }

    fn delete_entry(&mut self, path: &str) -> bool {
        let existed = self.entry(path).is_some();
        self.upper.remove(path);
        if self.base.entry(path).is_some() {
            self.whiteouts.insert(path.to_string());
        }
        existed
    }

    fn paths(&self) -> Vec<String> {
        let mut merged: BTreeSet<String> = self
            .base
            .iter()
            .map(|(file, _)| file)
            .filter(|file| !self.whiteouts.contains(*file))
            .map(str::to_string)
            .collect();
        merged.extend(self.upper.keys().cloned());
        merged.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Arc<VirtualFileTree> {
        Arc::new(
            VirtualFileTree::from_files([("apis/xrd.yaml", "kind: X"), ("readme.md", "hi")])
                .unwrap(),
        )
    }

    #[test]
    fn test_writes_do_not_touch_base() {
        let base = base();
        let mut overlay = Overlay::new(Arc::clone(&base));
        overlay.write("models/go.mod", b"module m").unwrap();
        overlay.write("readme.md", b"changed").unwrap();

        assert_eq!(overlay.read("readme.md").unwrap(), b"changed");
        assert_eq!(base.read("readme.md").unwrap(), b"hi");
        assert!(!base.exists("models/go.mod"));
    }

    #[test]
    fn test_sibling_overlays_are_isolated() {
        let base = base();
        let mut first = Overlay::new(Arc::clone(&base));
        let second = Overlay::new(Arc::clone(&base));
        first.write("only-first.txt", b"1").unwrap();
        first.remove("apis/xrd.yaml").unwrap();

        assert!(!second.exists("only-first.txt"));
        assert!(second.exists("apis/xrd.yaml"));
        assert!(!first.exists("apis/xrd.yaml"));
    }

    #[test]
    fn test_whiteout_then_rewrite() {
        let mut overlay = Overlay::new(base());
        assert!(overlay.remove("readme.md").unwrap());
        assert!(!overlay.is_file("readme.md"));
        overlay.write("readme.md", b"again").unwrap();
        assert_eq!(overlay.read("readme.md").unwrap(), b"again");
    }

    #[test]
    fn test_flatten() {
        let mut overlay = Overlay::new(base());
        overlay.remove("readme.md").unwrap();
        overlay.write("new.txt", b"n").unwrap();
        assert_eq!(overlay.flatten().paths(), vec!["apis/xrd.yaml", "new.txt"]);
    }
}
