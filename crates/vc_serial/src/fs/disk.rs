use alloc::boxed::Box;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};

use crate::fs::{FilePath, Filesystem};
use crate::{Result, SerialError};

// -----------------------------------------------------------------------------
// DiskFilesystem

/// A [`Filesystem`] rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct DiskFilesystem {
    root: PathBuf,
}

impl DiskFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Converts a [`FilePath`] into a path on disk.
    ///
    /// `.` segments are dropped. Segments that would leave the root, such
    /// as `..` or a drive prefix, are rejected.
    pub fn to_native(&self, path: &FilePath) -> Result<PathBuf> {
        let mut native = self.root.clone();
        for segment in path.as_str().split('/') {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (None, _) | (Some(Component::CurDir), None) => {}
                (Some(Component::Normal(part)), None) => native.push(part),
                _ => return Err(SerialError::PathEscapesRoot(path.clone())),
            }
        }
        Ok(native)
    }

    fn map_error(path: &FilePath, error: io::Error) -> SerialError {
        if error.kind() == io::ErrorKind::NotFound {
            SerialError::FileNotFound(path.clone())
        } else {
            error.into()
        }
    }
}

impl Filesystem for DiskFilesystem {
    fn open_read(&self, path: &FilePath) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(self.to_native(path)?).map_err(|e| Self::map_error(path, e))?;
        Ok(Box::new(file))
    }

    fn open_write(&self, path: &FilePath) -> Result<Box<dyn Write + Send>> {
        let native = self.to_native(path)?;
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(fs::File::create(native)?))
    }

    fn exists(&self, path: &FilePath) -> bool {
        self.to_native(path).is_ok_and(|native| native.is_file())
    }

    fn remove(&self, path: &FilePath) -> Result<()> {
        fs::remove_file(self.to_native(path)?).map_err(|e| Self::map_error(path, e))
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_under_the_root() {
        let root = std::env::temp_dir().join(format!("vc_serial_disk_{}", std::process::id()));
        let fs = DiskFilesystem::new(&root);
        let path = FilePath::new("nested/dir/data.bin");

        fs.open_write(&path).unwrap().write_all(b"payload").unwrap();
        assert!(fs.exists(&path));

        let mut content = Vec::new();
        fs.open_read(&path).unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"payload");

        fs.remove(&path).unwrap();
        assert!(!fs.exists(&path));
        assert!(matches!(
            fs.open_read(&path),
            Err(SerialError::FileNotFound(_))
        ));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn paths_stay_under_the_root() {
        let fs = DiskFilesystem::new("/data/assets");
        assert_eq!(
            fs.to_native(&FilePath::new("./textures//wall.png")).unwrap(),
            Path::new("/data/assets/textures/wall.png")
        );

        let escaping = FilePath::new("textures/../../secret.txt");
        assert!(matches!(
            fs.to_native(&escaping),
            Err(SerialError::PathEscapesRoot(_))
        ));
        assert!(!fs.exists(&escaping));
        assert!(matches!(
            fs.open_write(&FilePath::new("..")),
            Err(SerialError::PathEscapesRoot(_))
        ));
    }
}
