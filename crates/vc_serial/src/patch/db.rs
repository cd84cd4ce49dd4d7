use alloc::string::String;
use alloc::vec::Vec;

use vc_utils::hash::HashMap;

use crate::ReflectId;
use crate::patch::{MigrationFn, PatchRecord};
use crate::serialized::SerializedReflectionObject;
use crate::types::SerializableReflectionType;

// -----------------------------------------------------------------------------
// PatchesDB

/// Version chains of every serializable type.
///
/// # Examples
///
/// ```
/// use vc_serial::ReflectId;
/// use vc_serial::patch::PatchesDB;
/// use vc_serial::types::FieldShape;
///
/// let mut patches = PatchesDB::new();
/// patches.add_patch("", -1, "TestClass", 0).add_field("val", FieldShape::Value);
/// patches.add_patch("TestClass", 0, "RenamedClass", 1);
///
/// assert_eq!(
///     patches.find_latest_type(ReflectId::of("TestClass"), 0),
///     Some(ReflectId::of("RenamedClass")),
/// );
/// ```
#[derive(Default)]
pub struct PatchesDB {
    records: Vec<PatchRecord>,
    roots: Vec<usize>,
    migration_fns: HashMap<String, MigrationFn>,
}

impl PatchesDB {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a version step.
    ///
    /// An empty `old_type_name` starts a new chain. Otherwise the record is
    /// appended after the record producing `(old_type_name, old_version)`,
    /// or starts a new chain if there is none.
    ///
    /// The new version must be greater than the old one.
    pub fn add_patch(
        &mut self,
        old_type_name: &str,
        old_version: i32,
        new_type_name: &str,
        new_version: i32,
    ) -> &mut PatchRecord {
        debug_assert!(
            old_version < new_version,
            "patch `{old_type_name}`@{old_version} -> `{new_type_name}`@{new_version} does not advance the version"
        );

        let old_type_id = ReflectId::of(old_type_name);
        let index = self.records.len();
        self.records.push(PatchRecord::new(old_type_id, old_version, new_type_name, new_version));

        let previous = if old_type_id.is_none() {
            None
        } else {
            self.find_record_index(old_type_id, old_version)
                .filter(|&previous| previous != index)
        };

        match previous {
            Some(previous) => {
                if let Some(replaced) = self.records[previous].next.replace(index) {
                    log::warn!(
                        "patch `{old_type_name}`@{old_version} replaces the step to `{}`@{}",
                        self.records[replaced].new_type_name(),
                        self.records[replaced].new_version(),
                    );
                    self.detach(replaced);
                }
            }
            None => self.roots.push(index),
        }
        &mut self.records[index]
    }

    // Leaves an orphaned record unreachable from any root.
    fn detach(&mut self, index: usize) {
        self.roots.retain(|&root| root != index);
    }

    /// Searches the chains reachable from a root, detached records are never found.
    fn find_record_index(&self, type_id: ReflectId, version: i32) -> Option<usize> {
        self.roots.iter().find_map(|&root| {
            let mut current = Some(root);
            while let Some(i) = current {
                let record = &self.records[i];
                if record.new_type_id() == type_id && record.new_version() == version {
                    return Some(i);
                }
                current = record.next;
            }
            None
        })
    }

    fn root_of(&self, index: usize) -> Option<usize> {
        self.roots.iter().copied().find(|&root| {
            let mut current = Some(root);
            while let Some(i) = current {
                if i == index {
                    return true;
                }
                current = self.records[i].next;
            }
            false
        })
    }

    /// The record producing `(type_id, version)`, or the root of its chain.
    pub fn find_patch_record(
        &self,
        type_id: ReflectId,
        version: i32,
        find_root: bool,
    ) -> Option<&PatchRecord> {
        let index = self.find_record_index(type_id, version)?;
        let index = if find_root { self.root_of(index)? } else { index };
        Some(&self.records[index])
    }

    /// Every record of the chain containing `(type_id, version)`, root first.
    pub fn history(&self, type_id: ReflectId, version: i32) -> Vec<&PatchRecord> {
        let mut chain = Vec::new();
        let Some(index) = self.find_record_index(type_id, version) else {
            return chain;
        };
        let mut current = self.root_of(index);
        while let Some(i) = current {
            chain.push(&self.records[i]);
            current = self.records[i].next;
        }
        chain
    }

    /// The id the type saved as `(type_id, version)` is known by today.
    ///
    /// Follows the chain to its end, through renames.
    pub fn find_latest_type(&self, type_id: ReflectId, version: i32) -> Option<ReflectId> {
        let mut index = self.find_record_index(type_id, version)?;
        while let Some(next) = self.records[index].next {
            index = next;
        }
        Some(self.records[index].new_type_id())
    }

    /// Upgrades data saved as `(old_type_id, old_version)` to the latest version.
    ///
    /// Returns the id of the latest type, `None` if the saved version is unknown.
    pub fn migrate_data(
        &self,
        old_type_id: ReflectId,
        old_version: i32,
        object: &mut SerializedReflectionObject,
    ) -> Option<ReflectId> {
        let index = self.find_record_index(old_type_id, old_version)?;
        let mut latest = self.records[index].new_type_id();
        let mut current = self.records[index].next;
        while let Some(i) = current {
            let record = &self.records[i];
            log::debug!(
                "migrating {old_type_id}@{old_version} to `{}`@{}",
                record.new_type_name(),
                record.new_version()
            );
            record.migrate_data(object);
            latest = record.new_type_id();
            current = record.next;
        }
        Some(latest)
    }

    /// Seeds a chain describing `ty` as it is registered, unless its current
    /// version already has a record.
    pub fn add_initial_patch(&mut self, ty: &SerializableReflectionType) {
        if self.find_record_index(ty.id(), ty.version()).is_some() {
            return;
        }
        let record = self.add_patch("", -1, ty.name(), ty.version());
        for parent in ty.parents() {
            record.add_parent_id(parent.id(), parent.version());
        }
        for component in ty.components() {
            component.add_to_patch_record(record);
        }
    }

    // -------------------------------------------------------------------------
    // Migration functions

    /// Names a migration function so patch definitions can refer to it.
    pub fn register_migration_fn(&mut self, name: impl Into<String>, migration: MigrationFn) {
        self.migration_fns.insert(name.into(), migration);
    }

    pub fn find_migration_fn(&self, name: &str) -> Option<MigrationFn> {
        self.migration_fns.get(name).copied()
    }

    // -------------------------------------------------------------------------
    // Misc

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes every record, named migration functions stay registered.
    pub fn clear(&mut self) {
        self.records.clear();
        self.roots.clear();
    }
}

// -----------------------------------------------------------------------------
// Tests
