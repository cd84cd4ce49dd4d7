use alloc::string::String;
use core::fmt;

// -----------------------------------------------------------------------------
// FilePath

/// A path relative to a [`Filesystem`](crate::fs::Filesystem) root.
///
/// Separators are normalized to `/` and leading separators are removed,
/// so the same file is always spelled the same way.
///
/// # Examples
///
/// ```
/// use vc_serial::fs::FilePath;
///
/// let path = FilePath::new("\\textures\\wall.png");
/// assert_eq!(path.as_str(), "textures/wall.png");
/// assert_eq!(path.extension(), Some("png"));
/// assert_eq!(path.file_name(), "wall.png");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FilePath(String);

impl FilePath {
    pub fn new(path: impl Into<String>) -> Self {
        let mut path: String = path.into();
        if path.contains('\\') {
            path = path.replace('\\', "/");
        }
        let trimmed = path.trim_start_matches('/');
        if trimmed.len() != path.len() {
            path = String::from(trimmed);
        }
        Self(path)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last path segment.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(pos) => &self.0[pos + 1..],
            None => &self.0,
        }
    }

    /// The extension of the last path segment, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&name[pos + 1..]),
        }
    }
}

impl From<&str> for FilePath {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FilePath {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilePath({:?})", self.0)
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(FilePath::new("/a/b.txt"), FilePath::new("a\\b.txt"));
        assert_eq!(FilePath::new("plain").file_name(), "plain");
        assert_eq!(FilePath::new("dir/.hidden").extension(), None);
        assert_eq!(FilePath::new("dir.v2/file").extension(), None);
        assert!(FilePath::new("/").is_empty());
    }
}
