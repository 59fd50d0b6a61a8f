//! crossgen virtual filesystem
//!
//! Every stage of the model generation pipeline operates on in-memory trees
//! rather than the host filesystem. This crate provides:
//!
//! - [`VirtualFileTree`] - an ordered map of normalized relative paths to file entries
//! - [`Overlay`] - a copy-on-write view over a shared, read-only tree
//! - [`FileSystem`] - the trait both implement, used by every generator
//! - [`archive`] - tar packing and bounded unpacking for container transport
//!
//! # Paths
//!
//! Paths are relative and `/`-separated. Leading `/` and `./` are stripped and
//! `..` segments that would climb above the root are rejected, so no entry can
//! name a location outside its tree. Directories are implicit.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use crossgen_vfs::{FileSystem, Overlay, VirtualFileTree};
//!
//! let base = Arc::new(VirtualFileTree::from_files([("apis/xrd.yaml", "kind: X")]).unwrap());
//! let mut overlay = Overlay::new(Arc::clone(&base));
//! overlay.write("models/go.mod", b"module m").unwrap();
//! assert!(!base.exists("models/go.mod"));
//! ```

pub mod archive;
pub mod error;
pub mod fs;
pub mod overlay;
pub mod path;
pub mod tree;

pub use archive::{pack, unpack, PackOptions, UnpackOptions, DEFAULT_MAX_FILE_SIZE};
pub use error::{VfsError, VfsResult};
pub use fs::{FileEntry, FileSystem};
pub use overlay::Overlay;
pub use tree::{copy_dir, VirtualFileTree};
