use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::PatchError;
use crate::patch::PatchesDB;
use crate::types::FieldShape;

// -----------------------------------------------------------------------------
// Definition documents

/// A field added by a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub shape: FieldShape,
}

/// A field renamed by a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFieldEntry {
    pub from: String,
    pub to: String,
}

/// A base type added by a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentEntry {
    pub name: String,
    #[serde(default)]
    pub version: i32,
}

fn root_version() -> i32 {
    -1
}

/// One version step, as written in a definition document.
///
/// An empty `old_type` starts a new chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEntry {
    #[serde(default)]
    pub old_type: String,
    #[serde(default = "root_version")]
    pub old_version: i32,
    pub new_type: String,
    pub new_version: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_fields: Vec<FieldEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub change_fields: Vec<ChangeFieldEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_parents: Vec<ParentEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_parents: Vec<String>,
    /// Name of a function registered with [`PatchesDB::register_migration_fn`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration: Option<String>,
}

/// A list of patches, usually stored as RON next to the data it upgrades.
///
/// ```ron
/// (
///     patches: [
///         (new_type: "Player", new_version: 0, add_fields: [(name: "hp", shape: Value)]),
///         (old_type: "Player", old_version: 0, new_type: "Player", new_version: 1,
///          change_fields: [(from: "hp", to: "health")]),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchesDefinition {
    #[serde(default)]
    pub patches: Vec<PatchEntry>,
}

impl PatchesDefinition {
    pub fn from_ron(text: &str) -> Result<Self, PatchError> {
        Ok(ron::from_str(text)?)
    }
}

// -----------------------------------------------------------------------------
// Loading

impl PatchesDB {
    /// Adds every patch of `definition`.
    ///
    /// The whole document is validated first; on error nothing is added.
    pub fn load_definition(&mut self, definition: &PatchesDefinition) -> Result<(), PatchError> {
        for entry in &definition.patches {
            if entry.old_version >= entry.new_version {
                return Err(PatchError::NonIncreasingVersion {
                    old_type: entry.old_type.clone(),
                    old_version: entry.old_version,
                    new_type: entry.new_type.clone(),
                    new_version: entry.new_version,
                });
            }
            if let Some(name) = &entry.migration
                && self.find_migration_fn(name).is_none()
            {
                return Err(PatchError::UnknownMigrationFn(name.clone()));
            }
        }

        for entry in &definition.patches {
            let migration = entry
                .migration
                .as_deref()
                .and_then(|name| self.find_migration_fn(name));

            let record = self.add_patch(
                &entry.old_type,
                entry.old_version,
                &entry.new_type,
                entry.new_version,
            );
            for field in &entry.add_fields {
                record.add_field(&field.name, field.shape);
            }
            for name in &entry.remove_fields {
                record.remove_field(name);
            }
            for change in &entry.change_fields {
                record.change_field(&change.from, &change.to);
            }
            for parent in &entry.add_parents {
                record.add_parent(&parent.name, parent.version);
            }
            for name in &entry.remove_parents {
                record.remove_parent(name);
            }
            if let Some(migration) = migration {
                record.define_migration_fn(migration);
            }
        }

        log::debug!("loaded {} patch definitions", definition.patches.len());
        Ok(())
    }

    /// Parses a RON [`PatchesDefinition`] and adds its patches.
    pub fn load_ron(&mut self, text: &str) -> Result<(), PatchError> {
        let definition = PatchesDefinition::from_ron(text)?;
        self.load_definition(&definition)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReflectId;
    use crate::serialized::SerializedReflectionObject;

    const PLAYER: &str = r#"(
        patches: [
            (new_type: "Player", new_version: 0, add_fields: [(name: "hp", shape: Value)]),
            (
                old_type: "Player",
                old_version: 0,
                new_type: "Hero",
                new_version: 1,
                change_fields: [(from: "hp", to: "health")],
                add_parents: [(name: "Actor")],
            ),
        ],
    )"#;

    fn double_health(object: &mut SerializedReflectionObject) {
        let Some(value) = object.value_mut(ReflectId::of("health")) else {
            return;
        };
        if let Ok(health) = value.initialize::<i32>() {
            value.set(&(health * 2)).unwrap();
        }
    }

    #[test]
    fn parse_ron() {
        let definition = PatchesDefinition::from_ron(PLAYER).unwrap();
        assert_eq!(definition.patches.len(), 2);

        let first = &definition.patches[0];
        assert_eq!(first.old_type, "");
        assert_eq!(first.old_version, -1);
        assert_eq!(first.add_fields[0].shape, FieldShape::Value);

        let second = &definition.patches[1];
        assert_eq!(second.add_parents[0].version, 0);
        assert!(second.migration.is_none());
    }

    #[test]
    fn load_and_migrate() {
        let mut patches = PatchesDB::new();
        patches.load_ron(PLAYER).unwrap();

        let mut object = SerializedReflectionObject::new();
        object.add_value(ReflectId::of("hp")).set(&10_i32).unwrap();

        let latest = patches.migrate_data(ReflectId::of("Player"), 0, &mut object);
        assert_eq!(latest, Some(ReflectId::of("Hero")));
        let health = object.value_by_name("health").unwrap();
        assert_eq!(health.initialize::<i32>().unwrap(), 10);
    }

    #[test]
    fn named_migration() {
        let text = r#"(patches: [
            (new_type: "P", new_version: 0, add_fields: [(name: "health", shape: Value)]),
            (old_type: "P", old_version: 0, new_type: "P", new_version: 1, migration: Some("double")),
        ])"#;

        let mut patches = PatchesDB::new();
        patches.register_migration_fn("double", double_health);
        patches.load_ron(text).unwrap();

        let mut object = SerializedReflectionObject::new();
        object.add_value(ReflectId::of("health")).set(&4_i32).unwrap();
        patches.migrate_data(ReflectId::of("P"), 0, &mut object);
        assert_eq!(object.value_by_name("health").unwrap().initialize::<i32>().unwrap(), 8);
    }

    #[test]
    fn invalid_documents_add_nothing() {
        let mut patches = PatchesDB::new();

        let unknown = r#"(patches: [
            (new_type: "P", new_version: 0),
            (old_type: "P", old_version: 0, new_type: "P", new_version: 1, migration: Some("missing")),
        ])"#;
        let err = patches.load_ron(unknown).unwrap_err();
        assert!(matches!(err, PatchError::UnknownMigrationFn(name) if name == "missing"));
        assert!(patches.is_empty());

        let backwards = r#"(patches: [(old_type: "P", old_version: 3, new_type: "P", new_version: 2)])"#;
        let err = patches.load_ron(backwards).unwrap_err();
        assert!(matches!(err, PatchError::NonIncreasingVersion { old_version: 3, .. }));
        assert!(patches.is_empty());

        assert!(matches!(patches.load_ron("(patches: [").unwrap_err(), PatchError::Parse(_)));
    }

    #[test]
    fn json_documents() {
        let json = r#"{"patches": [{"new_type": "P", "new_version": 0,
            "add_fields": [{"name": "x", "shape": "ArrayOfValues"}]}]}"#;
        let definition: PatchesDefinition = serde_json::from_str(json).unwrap();

        let mut patches = PatchesDB::new();
        patches.load_definition(&definition).unwrap();
        let record = patches.find_patch_record(ReflectId::of("P"), 0, false).unwrap();
        assert_eq!(record.fields_to_add(), &[(ReflectId::of("x"), FieldShape::ArrayOfValues)]);

        let text = serde_json::to_string(&definition).unwrap();
        assert!(!text.contains("migration"));
    }
}
