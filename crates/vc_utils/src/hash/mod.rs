//! Provide hash containers, re-exports *hashbrown* and *foldhash*.
//!
//! - [`FixedHashState`]: deterministic hashing for containers.
//! - [`fnv1a_32`]: a specified hash, used to derive wire identifiers.
//! - [`NoOpHashState`]: pass-through hashing for keys that already are hashes.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};
pub use hasher::{NoOpHashState, NoOpHasher};
pub use hasher::fnv1a_32;

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`] by default.
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

/// A [`hashbrown::HashMap`] for keys that are already well distributed hashes.
pub type NoOpHashMap<K, V> = hashbrown::HashMap<K, V, NoOpHashState>;

/// A [`hashbrown::HashSet`] for keys that are already well distributed hashes.
pub type NoOpHashSet<T> = hashbrown::HashSet<T, NoOpHashState>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;
