use alloc::boxed::Box;
use alloc::string::String;
use core::any::Any;
use core::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::dependency::{DependencyCollector, DependencyLinker, DependencyMapper};
use crate::patch::PatchRecord;
use crate::serialized::SerializedReflectionObject;
use crate::types::FieldCodec;
use crate::{ReflectId, Result};

// -----------------------------------------------------------------------------
// FieldShape

/// How a field is laid out in a [`SerializedReflectionObject`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldShape {
    Value,
    Pointer,
    ArrayOfValues,
    ArrayOfPointers,
}

// -----------------------------------------------------------------------------
// ComponentTraits

bitflags! {
    /// Flags modulating how a field takes part in serialization.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentTraits: u8 {
        /// Exposed as an editable property.
        const EDITABLE  = 1 << 0;
        /// Transient state, never saved, loaded or mapped.
        const RUNTIME   = 1 << 1;
        /// A non-owning back reference.
        const REFERENCE = 1 << 2;
    }
}

// -----------------------------------------------------------------------------
// TypeComponent

/// Describes one member field of a serializable type.
///
/// The field's storage is reached through the accessors captured by its
/// [`FieldCodec`]; the component adds the name, the stable id and the
/// traits on top.
pub struct TypeComponent {
    name: String,
    id: ReflectId,
    owner: ReflectId,
    traits: ComponentTraits,
    label: Option<String>,
    codec: Box<dyn FieldCodec>,
}

impl TypeComponent {
    pub fn new(name: impl Into<String>, owner: ReflectId, codec: Box<dyn FieldCodec>) -> Self {
        let name = name.into();
        Self {
            id: ReflectId::of(&name),
            name,
            owner,
            traits: codec.default_traits(),
            label: None,
            codec,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.id
    }

    /// The id of the type declaring this field.
    #[inline]
    pub fn owner(&self) -> ReflectId {
        self.owner
    }

    #[inline]
    pub fn shape(&self) -> FieldShape {
        self.codec.shape()
    }

    #[inline]
    pub fn traits(&self) -> ComponentTraits {
        self.traits
    }

    #[inline]
    pub fn has_traits(&self, traits: ComponentTraits) -> bool {
        self.traits.contains(traits)
    }

    #[inline]
    pub fn is_runtime(&self) -> bool {
        self.traits.contains(ComponentTraits::RUNTIME)
    }

    /// The editor label, falls back to the member name.
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn set_traits(&mut self, traits: ComponentTraits) -> &mut Self {
        self.traits |= traits;
        self
    }

    /// Marks the field editable under the given label.
    pub fn set_editable(&mut self, label: impl Into<String>) -> &mut Self {
        self.traits |= ComponentTraits::EDITABLE;
        self.label = Some(label.into());
        self
    }

    /// Excludes the field from serialization.
    pub fn set_runtime(&mut self) -> &mut Self {
        self.set_traits(ComponentTraits::RUNTIME)
    }

    pub fn save(
        &self,
        host: &dyn Any,
        mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()> {
        if self.is_runtime() {
            return Ok(());
        }
        self.codec.save(host, self.id, mapper, out)
    }

    pub fn load(&self, host: &mut dyn Any, saved: &SerializedReflectionObject) -> Result<()> {
        if self.is_runtime() {
            return Ok(());
        }
        self.codec.load(host, self.id, saved)
    }

    pub fn map_dependencies(&self, host: &dyn Any, collector: &mut dyn DependencyCollector) {
        if !self.is_runtime() {
            self.codec.map_dependencies(host, collector);
        }
    }

    pub fn restore_dependencies(&self, host: &mut dyn Any, linker: &dyn DependencyLinker) {
        if !self.is_runtime() {
            self.codec.restore_dependencies(host, linker);
        }
    }

    pub fn add_to_patch_record(&self, record: &mut PatchRecord) {
        if !self.is_runtime() {
            record.add_field_id(self.id, self.shape());
        }
    }
}

impl fmt::Debug for TypeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeComponent")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("shape", &self.shape())
            .field("traits", &self.traits)
            .finish()
    }
}
