//! Filesystem collaborator used by the file streams.
//!
//! - [`FilePath`]: a normalized, `/` separated path relative to a filesystem root.
//! - [`Filesystem`]: opens files for reading or writing.
//! - [`DiskFilesystem`]: files under a directory on disk.
//! - [`MemoryFilesystem`]: files kept in memory.

// -----------------------------------------------------------------------------
// Modules

mod disk;
mod file_path;
mod memory;

// -----------------------------------------------------------------------------
// Exports

pub use disk::DiskFilesystem;
pub use file_path::FilePath;
pub use memory::MemoryFilesystem;

// -----------------------------------------------------------------------------
// Filesystem

use alloc::boxed::Box;
use std::io::{Read, Write};

use crate::Result;

/// Opens files addressed by [`FilePath`].
///
/// Opening a missing file for reading reports
/// [`SerialError::FileNotFound`](crate::SerialError::FileNotFound).
pub trait Filesystem: Send + Sync {
    fn open_read(&self, path: &FilePath) -> Result<Box<dyn Read + Send>>;

    /// Opens a file for writing, replacing its previous content.
    fn open_write(&self, path: &FilePath) -> Result<Box<dyn Write + Send>>;

    fn exists(&self, path: &FilePath) -> bool;

    fn remove(&self, path: &FilePath) -> Result<()>;
}
