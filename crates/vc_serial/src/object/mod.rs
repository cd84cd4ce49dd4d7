//! The serializable object model.
//!
//! - [`ReflectionObject`]: implemented by every serializable instance.
//! - [`Resource`]: objects stored in their own files and referenced by path.
//! - [`ObjectRef`]: shared, lock guarded ownership of an object.
//! - [`Link`] / [`WeakLink`]: pointer fields between objects.
//! - [`ObjectHeader`]: the unique id and change listeners every object carries.
//! - [`ObjectsTracker`]: finds live objects by unique id during reloads.

// -----------------------------------------------------------------------------
// Modules

mod header;
mod link;
mod object;
mod object_ref;
mod tracker;
mod unique_id;

// -----------------------------------------------------------------------------
// Exports

pub use header::{ObjectHeader, ObjectListener};
pub use link::{Link, WeakLink};
pub use object::{ReflectAny, ReflectionObject, Resource};
pub use object_ref::{ObjectRef, WeakObjectRef};
pub use tracker::{DefaultObjectsTracker, ObjectsTracker};
pub use unique_id::UniqueId;
