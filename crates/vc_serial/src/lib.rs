#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod context;
mod error;
mod id;

pub mod dependency;
pub mod fs;
pub mod object;
pub mod patch;
pub mod progress;
pub mod serialized;
pub mod stream;
pub mod types;
pub mod util;

#[cfg(test)]
mod test_types;

// -----------------------------------------------------------------------------
// Top-level exports

pub use context::{SerialContext, SerialContextBuilder};
pub use error::{PatchError, RegistryError, Result, SerialError};
pub use id::{DependencyIndex, DependencySlot, ReflectId};

// -----------------------------------------------------------------------------
// Prelude

/// The serialization prelude.
///
/// This includes the most common types in this crate, re-exported for your convenience.
pub mod prelude {
    pub use crate::dependency::{ExternalDependencies, ReflectionLoader, ReflectionSaver};
    pub use crate::fs::FilePath;
    pub use crate::object::{Link, ObjectHeader, ObjectRef, ReflectionObject, Resource};
    pub use crate::object::{UniqueId, WeakLink};
    pub use crate::types::{ComponentTraits, Reflected, ReflectedEnum, TypeBuilder};
    pub use crate::{ReflectId, SerialContext};
}

// -----------------------------------------------------------------------------
// Macro exports

#[doc(hidden)]
pub mod __macro_exports {
    #[cfg(feature = "auto_register")]
    pub use inventory;
}
