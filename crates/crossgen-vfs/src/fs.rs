//! The `FileSystem` abstraction shared by trees and overlays.

use std::collections::BTreeSet;

use glob::{MatchOptions, Pattern};

use crate::error::{VfsError, VfsResult};
use crate::path;

/// Default permission bits for regular files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// A single entry of a virtual tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File contents; empty for symlinks.
    pub contents: Vec<u8>,
    /// Unix permission bits.
    pub mode: u32,
    /// Target of the symlink, if this entry is one.
    pub symlink: Option<String>,
}

impl FileEntry {
    /// Creates a regular file entry with default permissions.
    pub fn file(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            mode: DEFAULT_FILE_MODE,
            symlink: None,
        }
    }

    /// Creates a symlink entry pointing at `target`.
    pub fn symlink(target: impl Into<String>) -> Self {
        Self {
            contents: Vec::new(),
            mode: 0o777,
            symlink: Some(target.into()),
        }
    }

    /// Returns true if this entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.symlink.is_some()
    }
}

/// Read/write access to a tree of files keyed by normalized relative paths.
///
/// Directories are implicit: a path is a directory iff at least one file
/// lives beneath it. The root (`""`) is always a directory.
pub trait FileSystem: Send + Sync {
    /// Returns the entry stored at a normalized path.
    fn entry(&self, path: &str) -> Option<&FileEntry>;

    /// Stores an entry at a normalized path, replacing any previous one.
    fn put_entry(&mut self, path: String, entry: FileEntry);

    /// Removes the entry at a normalized path, returning whether it existed.
    fn delete_entry(&mut self, path: &str) -> bool;

    /// Returns every file path in sorted order.
    fn paths(&self) -> Vec<String>;

    /// Reads a file.
    fn read(&self, path: &str) -> VfsResult<&[u8]> {
        let key = path::normalize_file(path)?;
        self.entry(&key)
            .map(|entry| entry.contents.as_slice())
            .ok_or_else(|| VfsError::not_found(key))
    }

    /// Reads a file as UTF-8.
    fn read_to_string(&self, path: &str) -> VfsResult<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| VfsError::NotUtf8 {
            path: path.to_string(),
        })
    }

    /// Writes a regular file with default permissions.
    fn write(&mut self, path: &str, contents: &[u8]) -> VfsResult<()> {
        let key = path::normalize_file(path)?;
        self.put_entry(key, FileEntry::file(contents));
        Ok(())
    }

    /// Writes an entry at a (not yet normalized) path.
    fn write_entry(&mut self, path: &str, entry: FileEntry) -> VfsResult<()> {
        let key = path::normalize_file(path)?;
        self.put_entry(key, entry);
        Ok(())
    }

    /// Removes a single file.
    fn remove(&mut self, path: &str) -> VfsResult<bool> {
        let key = path::normalize_file(path)?;
        Ok(self.delete_entry(&key))
    }

    /// Removes every file beneath a directory, returning how many were removed.
    fn remove_dir(&mut self, dir: &str) -> VfsResult<usize> {
        let files = self.files_under(dir)?;
        for file in &files {
            self.delete_entry(file);
        }
        Ok(files.len())
    }

    /// Returns true if `path` names a file.
    fn is_file(&self, path: &str) -> bool {
        path::normalize_file(path)
            .map(|key| self.entry(&key).is_some())
            .unwrap_or(false)
    }

    /// Returns true if `path` names a directory.
    fn is_dir(&self, path: &str) -> bool {
        match path::normalize(path) {
            Ok(key) if key.is_empty() => true,
            Ok(key) => self
                .paths()
                .iter()
                .any(|file| path::strip_dir(file, &key).is_some()),
            Err(_) => false,
        }
    }

    /// Returns true if `path` names a file or a directory.
    fn exists(&self, path: &str) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    /// Returns every file path beneath `dir`, sorted.
    fn files_under(&self, dir: &str) -> VfsResult<Vec<String>> {
        let key = path::normalize(dir)?;
        Ok(self
            .paths()
            .into_iter()
            .filter(|file| path::strip_dir(file, &key).is_some())
            .collect())
    }

    /// Returns every implicit directory path, sorted.
    fn dirs(&self) -> Vec<String> {
        let mut dirs = BTreeSet::new();
        for file in self.paths() {
            for dir in path::ancestors(&file) {
                dirs.insert(dir.to_string());
            }
        }
        dirs.into_iter().collect()
    }

    /// Matches a glob pattern against files and directories.
    ///
    /// `*` never crosses a `/`; matches are returned sorted.
    fn glob(&self, pattern: &str) -> VfsResult<Vec<String>> {
        let compiled = Pattern::new(pattern).map_err(|source| VfsError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let mut matches: BTreeSet<String> = BTreeSet::new();
        for candidate in self.paths().into_iter().chain(self.dirs()) {
            if compiled.matches_with(&candidate, options) {
                matches.insert(candidate);
            }
        }
        Ok(matches.into_iter().collect())
    }

    /// Returns the number of files.
    fn len(&self) -> usize {
        self.paths().len()
    }

    /// Returns true if there are no files.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
