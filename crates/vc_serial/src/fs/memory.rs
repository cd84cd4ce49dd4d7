use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Mutex, PoisonError};

use vc_utils::hash::HashMap;

use crate::fs::{FilePath, Filesystem};
use crate::{Result, SerialError};

type FileTable = Arc<Mutex<HashMap<FilePath, Vec<u8>>>>;

// -----------------------------------------------------------------------------
// MemoryFilesystem

/// A [`Filesystem`] keeping every file in memory.
///
/// Clones share the same files. Written data becomes visible when the
/// writer is flushed or dropped.
///
/// # Examples
///
/// ```
/// use std::io::Write;
/// use vc_serial::fs::{FilePath, Filesystem, MemoryFilesystem};
///
/// let fs = MemoryFilesystem::new();
/// let path = FilePath::new("a.bin");
/// fs.open_write(&path).unwrap().write_all(&[1, 2, 3]).unwrap();
///
/// assert_eq!(fs.contents(&path), Some(vec![1, 2, 3]));
/// ```
#[derive(Clone, Default)]
pub struct MemoryFilesystem {
    files: FileTable,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a file, replacing any previous content.
    pub fn insert(&self, path: FilePath, bytes: Vec<u8>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, bytes);
    }

    /// A copy of a file's content.
    pub fn contents(&self, path: &FilePath) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Filesystem for MemoryFilesystem {
    fn open_read(&self, path: &FilePath) -> Result<Box<dyn Read + Send>> {
        match self.contents(path) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes))),
            None => Err(SerialError::FileNotFound(path.clone())),
        }
    }

    fn open_write(&self, path: &FilePath) -> Result<Box<dyn Write + Send>> {
        self.insert(path.clone(), Vec::new());
        Ok(Box::new(MemoryFile {
            files: self.files.clone(),
            path: path.clone(),
            buffer: Vec::new(),
        }))
    }

    fn exists(&self, path: &FilePath) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(path)
    }

    fn remove(&self, path: &FilePath) -> Result<()> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| SerialError::FileNotFound(path.clone()))
    }
}

// -----------------------------------------------------------------------------
// MemoryFile

struct MemoryFile {
    files: FileTable,
    path: FilePath,
    buffer: Vec<u8>,
}

impl MemoryFile {
    fn commit(&self) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(self.path.clone(), self.buffer.clone());
    }
}

impl Write for MemoryFile {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit();
        Ok(())
    }
}

impl Drop for MemoryFile {
    fn drop(&mut self) {
        self.commit();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_shared_between_clones() {
        let fs = MemoryFilesystem::new();
        let other = fs.clone();
        let path = FilePath::new("dir/file");

        {
            let mut file = fs.open_write(&path).unwrap();
            file.write_all(b"abc").unwrap();
        }
        assert!(other.exists(&path));

        let mut content = Vec::new();
        other.open_read(&path).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"abc");
        assert_eq!(other.len(), 1);

        other.remove(&path).unwrap();
        assert!(!fs.exists(&path));
        assert!(fs.remove(&path).is_err());
    }
}
