//! Object graph archiving.
//!
//! A [`ReflectionSaver`] walks the graph reachable from its roots and
//! writes one archive. Objects implementing
//! [`Resource`](crate::object::Resource) are external dependencies, stored
//! by path only. Every other object is an internal dependency, stored once
//! per archive.
//!
//! A [`ReflectionLoader`] reads the archive back in two passes: first every
//! internal object is instantiated, then pointer fields are linked to the
//! instances. Links to external dependencies keep their index until an
//! [`ExternalDependenciesLinker`] binds them.

use alloc::vec::Vec;

use crate::DependencyIndex;
use crate::object::ObjectRef;

// -----------------------------------------------------------------------------
// Modules

mod external;
mod loader;
mod resource;
mod saver;

// -----------------------------------------------------------------------------
// Exports

pub use external::{ExternalDependenciesLinker, FindResourceDelegate};
pub use loader::{ExternalDependencies, ReflectionLoader};
pub use resource::ResourceDependenciesMapper;
pub use saver::ReflectionSaver;

/// Magic number opening every archive.
pub const ARCHIVE_MAGIC: u32 = 0x5643_5352;

// -----------------------------------------------------------------------------
// Passes

/// Turns pointers into compressed indices while saving.
pub trait DependencyMapper {
    fn find_dependency(&self, object: Option<&ObjectRef>) -> DependencyIndex;
}

/// Receives the objects a field points to.
pub trait DependencyCollector {
    fn add_dependency(&mut self, object: &ObjectRef);
}

impl DependencyCollector for Vec<ObjectRef> {
    #[inline]
    fn add_dependency(&mut self, object: &ObjectRef) {
        self.push(object.clone());
    }
}

/// What a saved index resolves to.
#[derive(Debug, Clone)]
pub enum LinkTarget {
    Null,
    Object(ObjectRef),
    /// Not bound yet, the link keeps this index.
    Pending(DependencyIndex),
}

/// Turns compressed indices back into objects while loading.
pub trait DependencyLinker {
    fn find_dependency(&self, index: DependencyIndex) -> LinkTarget;
}
