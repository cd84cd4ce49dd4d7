use alloc::string::String;
use core::fmt;

// -----------------------------------------------------------------------------
// UniqueId

/// A stable identity of an object across saves.
///
/// Used to find already loaded instances when an archive is loaded again.
/// The empty id means "anonymous", such objects are never matched.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UniqueId(String);

impl UniqueId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for UniqueId {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UniqueId({:?})", self.0)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
