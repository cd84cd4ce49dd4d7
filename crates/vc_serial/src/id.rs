use core::fmt;
use core::hash::{Hash, Hasher};

use vc_utils::hash::fnv1a_32;

// -----------------------------------------------------------------------------
// ReflectId

/// A stable identifier derived from a type or member name.
///
/// The id is the 32 bit FNV-1a hash of the UTF-8 name. It is written to
/// archives, so it must not change between runs, builds or platforms.
///
/// The empty name maps to [`ReflectId::NONE`].
///
/// # Examples
///
/// ```
/// use vc_serial::ReflectId;
///
/// assert_eq!(ReflectId::of("Texture"), ReflectId::of("Texture"));
/// assert_ne!(ReflectId::of("Texture"), ReflectId::of("Material"));
/// assert!(ReflectId::of("").is_none());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ReflectId(u32);

impl ReflectId {
    /// The id of "no type".
    pub const NONE: Self = Self(0);

    /// Computes the id of a name.
    pub fn of(name: &str) -> Self {
        if name.is_empty() {
            return Self::NONE;
        }
        match fnv1a_32(name.as_bytes()) {
            // Zero is reserved for `NONE`.
            0 => Self(1),
            hash => Self(hash),
        }
    }

    #[inline(always)]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl Hash for ReflectId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Already a hash. Mirror it into the high half for pass-through hashers.
        let raw = self.0 as u64;
        state.write_u64((raw << 32) | raw);
    }
}

impl fmt::Debug for ReflectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReflectId({:#010x})", self.0)
    }
}

impl fmt::Display for ReflectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

// -----------------------------------------------------------------------------
// DependencyIndex

/// A decoded [`DependencyIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySlot {
    Null,
    /// Zero-based index into the internal dependency table.
    Internal(usize),
    /// Zero-based index into the external dependency table.
    External(usize),
}

/// The compressed index stored in serialized pointer fields.
///
/// - `0` is the null pointer.
/// - Internal dependencies are stored as `index + 1`.
/// - External dependencies are stored as `(index + 1) | EXTERNAL_MARKER`.
///
/// # Examples
///
/// ```
/// use vc_serial::{DependencyIndex, DependencySlot};
///
/// assert_eq!(DependencyIndex::NULL.to_raw(), 0);
/// assert_eq!(DependencyIndex::internal(0).to_raw(), 1);
/// assert_eq!(DependencyIndex::external(2).decode(), DependencySlot::External(2));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DependencyIndex(u32);

impl DependencyIndex {
    pub const NULL: Self = Self(0);

    /// High bit marking external dependency indices.
    pub const EXTERNAL_MARKER: u32 = 0x8000_0000;

    #[inline]
    pub const fn internal(index: usize) -> Self {
        Self((index as u32 + 1) & !Self::EXTERNAL_MARKER)
    }

    #[inline]
    pub const fn external(index: usize) -> Self {
        Self((index as u32 + 1) | Self::EXTERNAL_MARKER)
    }

    #[inline(always)]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn is_external(self) -> bool {
        self.0 & Self::EXTERNAL_MARKER != 0
    }

    pub const fn decode(self) -> DependencySlot {
        if self.0 == 0 {
            DependencySlot::Null
        } else if self.is_external() {
            let raw = self.0 & !Self::EXTERNAL_MARKER;
            if raw == 0 {
                // A bare marker carries no index.
                DependencySlot::Null
            } else {
                DependencySlot::External(raw as usize - 1)
            }
        } else {
            DependencySlot::Internal(self.0 as usize - 1)
        }
    }

    /// Shifts an external index by `offset`, other indices are returned unchanged.
    pub const fn with_external_offset(self, offset: usize) -> Self {
        match self.decode() {
            DependencySlot::External(index) => Self::external(index + offset),
            _ => self,
        }
    }
}

impl fmt::Debug for DependencyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            DependencySlot::Null => f.write_str("DependencyIndex::NULL"),
            DependencySlot::Internal(i) => write!(f, "DependencyIndex::Internal({i})"),
            DependencySlot::External(i) => write!(f, "DependencyIndex::External({i})"),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_depend_on_name_only() {
        assert_eq!(ReflectId::of("m_val"), ReflectId::of("m_val"));
        assert_ne!(ReflectId::of("m_val"), ReflectId::of("m_str"));
        assert_eq!(ReflectId::of(""), ReflectId::NONE);
        assert!(!ReflectId::of("a").is_none());
    }

    #[test]
    fn ids_are_pinned_to_fnv1a() {
        assert_eq!(ReflectId::of("TestNode").to_raw(), 0x8C76_AA6D);
        assert_eq!(ReflectId::of("value").to_raw(), 0x425E_D3CA);
        assert_eq!(ReflectId::of("Widget").to_raw(), 0xEF95_3925);
    }

    #[test]
    fn compressed_indices() {
        let internal = DependencyIndex::internal(4);
        assert_eq!(internal.to_raw(), 5);
        assert!(!internal.is_external());
        assert_eq!(internal.decode(), DependencySlot::Internal(4));

        let external = DependencyIndex::external(0);
        assert_eq!(external.to_raw(), 0x8000_0001);
        assert!(external.is_external());
        assert_eq!(external.decode(), DependencySlot::External(0));

        assert_eq!(DependencyIndex::NULL.decode(), DependencySlot::Null);
        assert_eq!(
            DependencyIndex::from_raw(DependencyIndex::EXTERNAL_MARKER).decode(),
            DependencySlot::Null
        );
    }

    #[test]
    fn external_offset_only_moves_external_indices() {
        let external = DependencyIndex::external(1).with_external_offset(3);
        assert_eq!(external.decode(), DependencySlot::External(4));

        let internal = DependencyIndex::internal(1).with_external_offset(3);
        assert_eq!(internal.decode(), DependencySlot::Internal(1));
        assert!(DependencyIndex::NULL.with_external_offset(3).is_null());
    }
}
