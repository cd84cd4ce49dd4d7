use alloc::string::String;
use core::fmt;

use crate::patch::{MigrationFn, PatchesDB};
use crate::types::{Reflected, ReflectedEnum, TypesRegistry};
use crate::{PatchError, RegistryError};

// -----------------------------------------------------------------------------
// SerialContext

/// The built type registry and the patch database it was built with.
///
/// Created once by a [`SerialContextBuilder`] and read-only afterwards.
/// Share it with an `Arc` when several threads save or load.
///
/// # Examples
///
/// ```
/// use vc_serial::SerialContext;
///
/// let context = SerialContext::builder()
///     .with_external_type("Vector3")
///     .build()
///     .unwrap();
/// assert!(context.registry().is_built());
/// ```
pub struct SerialContext {
    registry: TypesRegistry,
    patches: PatchesDB,
}

impl fmt::Debug for SerialContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialContext").finish_non_exhaustive()
    }
}

impl SerialContext {
    #[inline]
    pub fn builder() -> SerialContextBuilder {
        SerialContextBuilder::new()
    }

    #[inline]
    pub fn registry(&self) -> &TypesRegistry {
        &self.registry
    }

    #[inline]
    pub fn patches(&self) -> &PatchesDB {
        &self.patches
    }
}

// -----------------------------------------------------------------------------
// SerialContextBuilder

/// Collects types and patches, then builds a [`SerialContext`].
#[derive(Default)]
pub struct SerialContextBuilder {
    registry: TypesRegistry,
    patches: PatchesDB,
}

impl SerialContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type<T: Reflected>(mut self) -> Self {
        if !self.registry.add_serializable_type::<T>() {
            log::warn!("type `{}` is already registered", T::TYPE_NAME);
        }
        self
    }

    pub fn with_enum_type<E: ReflectedEnum>(mut self) -> Self {
        if !self.registry.add_enum_type::<E>() {
            log::warn!("enum `{}` is already registered", E::TYPE_NAME);
        }
        self
    }

    pub fn with_external_type(mut self, name: impl Into<String>) -> Self {
        self.registry.add_external_type(name);
        self
    }

    /// Registers every type submitted with [`register_type!`](crate::register_type).
    #[cfg(feature = "auto_register")]
    pub fn auto_register(mut self) -> Self {
        let count = self.registry.auto_register();
        log::debug!("auto registered {count} types");
        self
    }

    pub fn with_migration_fn(mut self, name: impl Into<String>, migration: MigrationFn) -> Self {
        self.patches.register_migration_fn(name, migration);
        self
    }

    /// Authors patches in code.
    pub fn with_patches(mut self, f: impl FnOnce(&mut PatchesDB)) -> Self {
        f(&mut self.patches);
        self
    }

    /// Adds the patches of a RON [`PatchesDefinition`](crate::patch::PatchesDefinition).
    ///
    /// Migration functions it names must be registered first.
    pub fn load_patches_ron(mut self, text: &str) -> Result<Self, PatchError> {
        self.patches.load_ron(text)?;
        Ok(self)
    }

    /// Builds the registry, seeding the patch database with the current
    /// version of every type.
    pub fn build(mut self) -> Result<SerialContext, RegistryError> {
        self.registry.build(&mut self.patches)?;
        log::debug!(
            "serial context built with {} types and {} patch records",
            self.registry.len(),
            self.patches.len()
        );
        Ok(SerialContext {
            registry: self.registry,
            patches: self.patches,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests
