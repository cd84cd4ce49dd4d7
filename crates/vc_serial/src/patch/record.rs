use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::ReflectId;
use crate::serialized::SerializedReflectionObject;
use crate::types::FieldShape;

/// A custom data migration step.
pub type MigrationFn = fn(&mut SerializedReflectionObject);

// -----------------------------------------------------------------------------
// PatchRecord

/// One step in a type's version history.
///
/// A record maps `(old type, old version)` to `(new type, new version)`
/// and lists the field edits between them. The first record of a chain has
/// no old type.
///
/// Migrating applies renames first, then additions, then the custom
/// function, then removals. The custom function therefore sees both the
/// old and the new fields.
pub struct PatchRecord {
    pub(crate) next: Option<usize>,
    old_type_id: ReflectId,
    old_version: i32,
    new_type_name: String,
    new_type_id: ReflectId,
    new_version: i32,

    fields_to_remove: Vec<ReflectId>,
    fields_to_add: Vec<(ReflectId, FieldShape)>,
    fields_to_change: Vec<(ReflectId, ReflectId)>,
    parents_to_add: Vec<(ReflectId, i32)>,
    parents_to_remove: Vec<ReflectId>,
    migration: Option<MigrationFn>,
}

impl PatchRecord {
    pub(crate) fn new(old_type_id: ReflectId, old_version: i32, new_type_name: &str, new_version: i32) -> Self {
        Self {
            next: None,
            old_type_id,
            old_version,
            new_type_name: String::from(new_type_name),
            new_type_id: ReflectId::of(new_type_name),
            new_version,
            fields_to_remove: Vec::new(),
            fields_to_add: Vec::new(),
            fields_to_change: Vec::new(),
            parents_to_add: Vec::new(),
            parents_to_remove: Vec::new(),
            migration: None,
        }
    }

    #[inline]
    pub fn old_type_id(&self) -> ReflectId {
        self.old_type_id
    }

    #[inline]
    pub fn old_version(&self) -> i32 {
        self.old_version
    }

    #[inline]
    pub fn new_type_name(&self) -> &str {
        &self.new_type_name
    }

    #[inline]
    pub fn new_type_id(&self) -> ReflectId {
        self.new_type_id
    }

    #[inline]
    pub fn new_version(&self) -> i32 {
        self.new_version
    }

    /// Whether the record starts a chain.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.old_type_id.is_none()
    }

    // -------------------------------------------------------------------------
    // Fields

    pub fn add_field(&mut self, name: &str, shape: FieldShape) -> &mut Self {
        self.add_field_id(ReflectId::of(name), shape)
    }

    pub fn add_field_id(&mut self, id: ReflectId, shape: FieldShape) -> &mut Self {
        if !self.fields_to_add.iter().any(|(f, _)| *f == id) {
            self.fields_to_add.push((id, shape));
        }
        self
    }

    pub fn remove_field(&mut self, name: &str) -> &mut Self {
        let id = ReflectId::of(name);
        if !self.fields_to_remove.contains(&id) {
            self.fields_to_remove.push(id);
        }
        self
    }

    pub fn change_field(&mut self, old_name: &str, new_name: &str) -> &mut Self {
        let change = (ReflectId::of(old_name), ReflectId::of(new_name));
        if !self.fields_to_change.contains(&change) {
            self.fields_to_change.push(change);
        }
        self
    }

    pub fn fields_to_add(&self) -> &[(ReflectId, FieldShape)] {
        &self.fields_to_add
    }

    pub fn fields_to_remove(&self) -> &[ReflectId] {
        &self.fields_to_remove
    }

    pub fn fields_to_change(&self) -> &[(ReflectId, ReflectId)] {
        &self.fields_to_change
    }

    // -------------------------------------------------------------------------
    // Parents

    /// Records a new base type. Cancels a pending removal of the same base.
    pub fn add_parent(&mut self, name: &str, version: i32) -> &mut Self {
        self.add_parent_id(ReflectId::of(name), version)
    }

    pub fn add_parent_id(&mut self, id: ReflectId, version: i32) -> &mut Self {
        if let Some(index) = self.parents_to_remove.iter().position(|p| *p == id) {
            self.parents_to_remove.remove(index);
        } else if !self.parents_to_add.iter().any(|(p, _)| *p == id) {
            self.parents_to_add.push((id, version));
        }
        self
    }

    /// Records a dropped base type. Cancels a pending addition of the same base.
    pub fn remove_parent(&mut self, name: &str) -> &mut Self {
        let id = ReflectId::of(name);
        if let Some(index) = self.parents_to_add.iter().position(|(p, _)| *p == id) {
            self.parents_to_add.remove(index);
        } else if !self.parents_to_remove.contains(&id) {
            self.parents_to_remove.push(id);
        }
        self
    }

    pub fn parents_to_add(&self) -> &[(ReflectId, i32)] {
        &self.parents_to_add
    }

    pub fn parents_to_remove(&self) -> &[ReflectId] {
        &self.parents_to_remove
    }

    // -------------------------------------------------------------------------
    // Migration

    pub fn define_migration_fn(&mut self, migration: MigrationFn) -> &mut Self {
        self.migration = Some(migration);
        self
    }

    #[inline]
    pub fn migration_fn(&self) -> Option<MigrationFn> {
        self.migration
    }

    /// Applies this record's edits to `object`.
    pub fn migrate_data(&self, object: &mut SerializedReflectionObject) {
        for (old, new) in &self.fields_to_change {
            object.change_field_id(*old, *new);
        }
        for (id, shape) in &self.fields_to_add {
            if object.field_shape(*id).is_none() {
                object.add_field(*id, *shape);
            }
        }
        if let Some(migration) = self.migration {
            migration(object);
        }
        for id in &self.fields_to_remove {
            object.remove_field(*id);
        }
    }
}

impl fmt::Debug for PatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRecord")
            .field("old", &(self.old_type_id, self.old_version))
            .field("new", &(&self.new_type_name, self.new_version))
            .field("add", &self.fields_to_add)
            .field("remove", &self.fields_to_remove)
            .field("change", &self.fields_to_change)
            .field("custom", &self.migration.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_edits_cancel_out() {
        let mut record = PatchRecord::new(ReflectId::NONE, -1, "A", 0);
        record.add_parent("Base", 0).add_parent("Base", 0);
        assert_eq!(record.parents_to_add().len(), 1);

        record.remove_parent("Base");
        assert!(record.parents_to_add().is_empty());
        assert!(record.parents_to_remove().is_empty());

        record.remove_parent("Other").add_parent("Other", 1);
        assert!(record.parents_to_remove().is_empty());
        assert!(record.parents_to_add().is_empty());
    }

    #[test]
    fn edits_apply_in_order() {
        fn copy_into_new(object: &mut SerializedReflectionObject) {
            let old = object.value_by_name("old").unwrap().initialize::<u32>().unwrap();
            object.value_by_name_mut("new").unwrap().set(&(old * 2)).unwrap();
        }

        let mut record = PatchRecord::new(ReflectId::of("A"), 0, "A", 1);
        record
            .add_field("new", FieldShape::Value)
            .remove_field("old")
            .define_migration_fn(copy_into_new);

        let mut object = SerializedReflectionObject::new();
        object.add_value(ReflectId::of("old")).set(&21_u32).unwrap();
        record.migrate_data(&mut object);

        assert!(object.value_by_name("old").is_none());
        assert_eq!(object.value_by_name("new").unwrap().initialize::<u32>().unwrap(), 42);
    }
}
