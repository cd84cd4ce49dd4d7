//! The patch and versioning database.
//!
//! Every serializable type owns a chain of [`PatchRecord`]s, one per schema
//! generation. Loading data saved by an old generation walks the chain
//! forward and applies each record's edits to the flat
//! [`SerializedReflectionObject`](crate::serialized::SerializedReflectionObject).
//!
//! Chains can be authored in code through [`PatchesDB::add_patch`] or
//! loaded from a [`PatchesDefinition`] document.

// -----------------------------------------------------------------------------
// Modules

mod db;
mod definition;
mod record;

// -----------------------------------------------------------------------------
// Exports

pub use db::PatchesDB;
pub use definition::{ChangeFieldEntry, FieldEntry, ParentEntry, PatchEntry, PatchesDefinition};
pub use record::{MigrationFn, PatchRecord};
