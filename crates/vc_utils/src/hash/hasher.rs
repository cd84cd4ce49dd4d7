//! Provide `FixedHasher` and `NoOpHasher`.
//!
//! `FixedHasher` is based on the `foldhash` crate and provides
//! deterministic results through a fixed seed. Values written to disk use
//! [`fnv1a_32`] instead.
//!
//! `NoOpHasher` uses integer keys directly as hash values.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHasher

/// The seed every fixed hasher starts from.
///
/// Changing it changes every persisted identifier.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x95EE04C4F326B271);

/// A hasher whose results only depend on the input.
///
/// A type alias for [`foldhash::fast::FoldHasher`], created through
/// [`FixedHashState::build_hasher`].
pub type FixedHasher = FoldHasher<'static>;

/// Fixed hash state based upon a random but fixed seed.
///
/// # Examples
///
/// ```
/// use core::hash::BuildHasher;
/// use vc_utils::hash::FixedHashState;
///
/// let a = FixedHashState.hash_one("Texture");
/// let b = FixedHashState.hash_one("Texture");
/// assert_eq!(a, b);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// FNV-1a

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32 bit FNV-1a over raw bytes.
///
/// Unlike [`FixedHashState`] the output is fixed by the algorithm itself,
/// not by a crate version, so it is safe to persist.
///
/// # Examples
///
/// ```
/// use vc_utils::hash::fnv1a_32;
///
/// assert_eq!(fnv1a_32(b""), 0x811C_9DC5);
/// assert_eq!(fnv1a_32(b"foobar"), 0xBF9C_F968);
/// ```
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

// -----------------------------------------------------------------------------
// NoOpHasher

/// A no-op hasher that passes integer keys straight through.
///
/// Keys should fill the high bits as well, the table control bytes
/// are taken from the top of the hash.
///
/// Created through [`NoOpHashState::build_hasher`].
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            // `write_u32(10)` and `write_u64(10)` must agree.
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Hash state for keys that are already hashes.
///
/// # Examples
///
/// ```
/// use core::hash::{Hash, Hasher, BuildHasher};
/// use vc_utils::hash::NoOpHashState;
///
/// let mut hasher = NoOpHashState.build_hasher();
/// 3_u64.hash(&mut hasher);
///
/// assert_eq!(hasher.finish(), 3_u64);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{HashMap, NoOpHashMap};

    #[test]
    fn fixed_state_is_deterministic() {
        assert_eq!(FixedHashState.hash_one("PatchRecord"), FixedHashState.hash_one("PatchRecord"));
    }

    #[test]
    fn fnv1a_reference_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811C_9DC5);
        assert_eq!(fnv1a_32(b"a"), 0xE40C_292C);
        assert_eq!(fnv1a_32(b"foobar"), 0xBF9C_F968);
    }

    #[test]
    fn noop_passes_u64_through() {
        let mut hasher = NoOpHashState.build_hasher();
        hasher.write_u64(0xDEAD_BEEF);
        assert_eq!(hasher.finish(), 0xDEAD_BEEF);
    }

    #[test]
    fn containers_with_custom_states() {
        let mut names: HashMap<&str, u32> = HashMap::default();
        names.insert("a", 1);
        assert_eq!(names.get("a"), Some(&1));

        let mut ids: NoOpHashMap<u32, &str> = NoOpHashMap::default();
        ids.insert(7, "seven");
        ids.insert(8, "eight");
        assert_eq!(ids.get(&7), Some(&"seven"));
        assert_eq!(ids.len(), 2);
    }
}
