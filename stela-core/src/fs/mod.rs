//! Hierarchical file layer
//!
//! Interprets the block region as a small tree of directories and text
//! files: a superblock at a fixed low block locates the root directory,
//! directories are extents of fixed-size records, files are extents of
//! text blocks. The layout is private to this firmware - there is no
//! host-OS interoperability, and none is wanted.
//!
//! The layer owns the current-directory cursor and treats the block
//! store strictly as a service; it never touches the medium directly.

mod dir;
mod layout;

pub use dir::Dirfs;
pub use layout::{RecordKind, NAME_LEN};

use crate::store::StorageError;

/// File layer failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FsError {
    /// No entry with that name in the current directory
    NotFound,
    /// Entry exists but is not a directory
    NotADirectory,
    /// Entry exists but is not a file
    NotAFile,
    /// An entry with that name already exists
    AlreadyExists,
    /// Name exceeds [`NAME_LEN`] bytes
    NameTooLong,
    /// No free record slot left in the directory's extent
    DirectoryFull,
    /// Directory still holds live entries
    DirectoryNotEmpty,
    /// Not enough unallocated blocks left in the region
    NoSpace,
    /// On-disk metadata failed validation
    Corrupted,
    /// Bytes that should be text are not valid UTF-8
    NotText,
    /// Underlying block store failure
    Storage(StorageError),
}

impl From<StorageError> for FsError {
    fn from(e: StorageError) -> Self {
        FsError::Storage(e)
    }
}
