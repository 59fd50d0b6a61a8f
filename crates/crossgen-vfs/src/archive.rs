//! Tar transport between virtual trees and container filesystems.
//!
//! Packing roots every entry under a prefix directory; unpacking strips a
//! prefix again and reads each file through a bounded reader.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tar::{Archive, Builder, EntryType, Header};
use walkdir::WalkDir;

use crate::error::{VfsError, VfsResult};
use crate::fs::{FileEntry, FileSystem};
use crate::path;

/// Default per-file cap applied when unpacking (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Options for [`pack`].
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Host directory the tree was loaded from; enables symlink resolution.
    pub symlink_base_path: Option<PathBuf>,
    /// Owner uid written into every header.
    pub uid: Option<u64>,
    /// Owner gid written into every header.
    pub gid: Option<u64>,
}

impl PackOptions {
    /// Resolve symlinks against `base`.
    pub fn with_symlink_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.symlink_base_path = Some(base.into());
        self
    }

    /// Override the owner of every entry.
    pub fn with_owner(mut self, uid: u64, gid: u64) -> Self {
        self.uid = Some(uid);
        self.gid = Some(gid);
        self
    }
}

/// Options for [`unpack`].
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    /// Prefix removed from each entry name (e.g. `input/`).
    pub strip_prefix: String,
    /// Maximum number of bytes read per file; longer files are truncated.
    pub max_file_size: u64,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            strip_prefix: String::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl UnpackOptions {
    /// Strip `prefix` from every entry name.
    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = prefix.into();
        self
    }

    /// Cap every extracted file at `bytes`.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}

/// Packs every file of `fs` into a tar stream rooted at `prefix`.
///
/// A directory entry for the prefix comes first, followed by every implicit
/// directory and every file. Symlinks are only allowed when
/// [`PackOptions::symlink_base_path`] is set; their targets are resolved on
/// the host and embedded under the link's path, and dangling links are
/// skipped.
pub fn pack(fs: &dyn FileSystem, prefix: &str, options: &PackOptions) -> VfsResult<Vec<u8>> {
    let prefix = path::normalize(prefix)?;
    let mut builder = Builder::new(Vec::new());

    if !prefix.is_empty() {
        append_dir(&mut builder, &prefix, options)?;
    }
    for dir in fs.dirs() {
        append_dir(&mut builder, &path::join(&prefix, &dir), options)?;
    }

    for file in fs.paths() {
        let Some(entry) = fs.entry(&file) else {
            continue;
        };
        if entry.is_symlink() {
            let Some(base) = options.symlink_base_path.as_deref() else {
                return Err(VfsError::SymlinkWithoutBase { path: file });
            };
            append_symlink_target(&mut builder, &prefix, &file, base, options)?;
            continue;
        }
        append_file(
            &mut builder,
            &path::join(&prefix, &file),
            entry.mode,
            &entry.contents,
            options,
        )?;
    }

    builder.into_inner().map_err(VfsError::Archive)
}

/// Unpacks a tar stream into `fs`, returning the number of files written.
///
/// Directory entries are ignored (directories are implicit) as are links and
/// special files. Entries whose names escape the root are rejected.
pub fn unpack<R: Read>(
    reader: R,
    fs: &mut dyn FileSystem,
    options: &UnpackOptions,
) -> VfsResult<usize> {
    let mut archive = Archive::new(reader);
    let mut written = 0;

    for entry in archive.entries().map_err(VfsError::Archive)? {
        let entry = entry.map_err(VfsError::Archive)?;
        let entry_type = entry.header().entry_type();
        if !matches!(entry_type, EntryType::Regular | EntryType::Continuous) {
            continue;
        }

        let raw = entry
            .path()
            .map_err(VfsError::Archive)?
            .to_string_lossy()
            .replace('\\', "/");
        let trimmed = raw.strip_prefix("./").unwrap_or(&raw);
        let name = trimmed
            .strip_prefix(options.strip_prefix.as_str())
            .unwrap_or(trimmed);
        let key = path::normalize_file(name)?;

        let mode = entry.header().mode().unwrap_or(0o644);
        let declared = entry.size();
        let mut contents = Vec::new();
        entry
            .take(options.max_file_size)
            .read_to_end(&mut contents)
            .map_err(VfsError::Archive)?;
        if declared > options.max_file_size {
            tracing::warn!(
                path = %key,
                size = declared,
                cap = options.max_file_size,
                "truncated oversized file while unpacking"
            );
        }

        fs.put_entry(
            key,
            FileEntry {
                contents,
                mode,
                symlink: None,
            },
        );
        written += 1;
    }

    Ok(written)
}

fn new_header(entry_type: EntryType, mode: u32, size: u64, options: &PackOptions) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mode(mode);
    header.set_size(size);
    header.set_mtime(0);
    if let Some(uid) = options.uid {
        header.set_uid(uid);
    }
    if let Some(gid) = options.gid {
        header.set_gid(gid);
    }
    header
}

fn append_dir(builder: &mut Builder<Vec<u8>>, dir: &str, options: &PackOptions) -> VfsResult<()> {
    let mut header = new_header(EntryType::Directory, 0o777, 0, options);
    builder
        .append_data(&mut header, format!("{}/", dir), io::empty())
        .map_err(VfsError::Archive)
}

fn append_file(
    builder: &mut Builder<Vec<u8>>,
    name: &str,
    mode: u32,
    contents: &[u8],
    options: &PackOptions,
) -> VfsResult<()> {
    let mut header = new_header(EntryType::Regular, mode, contents.len() as u64, options);
    builder
        .append_data(&mut header, name, contents)
        .map_err(VfsError::Archive)
}

fn append_symlink_target(
    builder: &mut Builder<Vec<u8>>,
    prefix: &str,
    link: &str,
    base: &Path,
    options: &PackOptions,
) -> VfsResult<()> {
    let host_link = base.join(link);
    let resolved = match fs::canonicalize(&host_link) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::debug!(link = %host_link.display(), error = %err, "skipping dangling symlink");
            return Ok(());
        }
    };
    let meta = fs::metadata(&resolved).map_err(|e| VfsError::host(&resolved, e))?;
    let virtual_link = path::join(prefix, link);

    if !meta.is_dir() {
        let contents = fs::read(&resolved).map_err(|e| VfsError::host(&resolved, e))?;
        return append_file(builder, &virtual_link, 0o644, &contents, options);
    }

    append_dir(builder, &virtual_link, options)?;
    for item in WalkDir::new(&resolved).follow_links(true).sort_by_file_name() {
        let item = item.map_err(|e| VfsError::host(&resolved, e.into()))?;
        let Ok(rel) = item.path().strip_prefix(&resolved) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }
        let rel = rel.to_string_lossy().replace('\\', "/");
        let name = path::join(&virtual_link, &rel);
        if item.file_type().is_dir() {
            append_dir(builder, &name, options)?;
        } else if item.file_type().is_file() {
            let contents = fs::read(item.path()).map_err(|e| VfsError::host(item.path(), e))?;
            append_file(builder, &name, 0o644, &contents, options)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::VirtualFileTree;
    use pretty_assertions::assert_eq;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = Archive::new(bytes);
        archive
            .entries()
            .unwrap()
            .map(|e| {
                let name = e.unwrap().path().unwrap().to_string_lossy().into_owned();
                name.trim_end_matches('/').to_string()
            })
            .collect()
    }

    #[test]
    fn test_pack_roots_entries_under_prefix() {
        let tree = VirtualFileTree::from_files([("a/b.yaml", "x"), ("c.yaml", "y")]).unwrap();
        let bytes = pack(&tree, "workdir", &PackOptions::default()).unwrap();
        assert_eq!(
            entry_names(&bytes),
            vec!["workdir", "workdir/a", "workdir/a/b.yaml", "workdir/c.yaml"]
        );
    }

    #[test]
    fn test_round_trip_with_input_prefix() {
        let tree = VirtualFileTree::from_files([("models/x.k", "schema X:")]).unwrap();
        let bytes = pack(&tree, "input", &PackOptions::default()).unwrap();

        let mut out = VirtualFileTree::new();
        let options = UnpackOptions::default().with_strip_prefix("input/");
        assert_eq!(unpack(bytes.as_slice(), &mut out, &options).unwrap(), 1);
        assert_eq!(out.read_to_string("models/x.k").unwrap(), "schema X:");
    }

    #[test]
    fn test_unpack_truncates_at_cap() {
        let big = vec![b'a'; 64];
        let tree = VirtualFileTree::from_files([("big.bin", big.as_slice())]).unwrap();
        let bytes = pack(&tree, "", &PackOptions::default()).unwrap();

        let mut out = VirtualFileTree::new();
        let options = UnpackOptions::default().with_max_file_size(16);
        unpack(bytes.as_slice(), &mut out, &options).unwrap();
        assert_eq!(out.read("big.bin").unwrap().len(), 16);
    }

    #[test]
    fn test_symlink_requires_base() {
        let mut tree = VirtualFileTree::new();
        tree.symlink("link", "target").unwrap();
        let err = pack(&tree, "", &PackOptions::default()).unwrap_err();
        assert!(matches!(err, VfsError::SymlinkWithoutBase { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_resolved_against_host() {
        let dir = tempfile::tempdir().unwrap();
        let shared = tempfile::tempdir().unwrap();
        fs::write(shared.path().join("lib.k"), "lib").unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("shared")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling"))
            .unwrap();
        fs::write(dir.path().join("main.k"), "main").unwrap();

        let tree = VirtualFileTree::load_dir(dir.path()).unwrap();
        let options = PackOptions::default().with_symlink_base(dir.path());
        let bytes = pack(&tree, "", &options).unwrap();

        let mut out = VirtualFileTree::new();
        unpack(bytes.as_slice(), &mut out, &UnpackOptions::default()).unwrap();
        assert_eq!(out.paths(), vec!["main.k", "shared/lib.k"]);
    }
}
