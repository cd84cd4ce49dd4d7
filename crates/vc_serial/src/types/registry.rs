use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use vc_utils::hash::{NoOpHashMap, NoOpHashSet};

use crate::patch::PatchesDB;
use crate::types::{
    EnumReflectionType, ReflectedEnum, ReflectionType, Reflected, SerializableReflectionType,
    TypeBuilder,
};
use crate::{ReflectId, RegistryError, Result, SerialError};

// -----------------------------------------------------------------------------
// TypesRegistry

/// The central store of reflected types.
///
/// External types are plain value shapes known by name only. Serializable
/// types carry member fields, base types and instantiators. Enum types
/// list their enumerators and all derive from the generic
/// [`ReflectionEnum`](EnumReflectionType::GENERIC_NAME) type.
///
/// Types are registered first, then the registry is [built](Self::build)
/// exactly once. After that it is only read.
///
/// # Examples
///
/// ```
/// use vc_serial::ReflectId;
/// use vc_serial::patch::PatchesDB;
/// use vc_serial::types::TypesRegistry;
///
/// let mut registry = TypesRegistry::new();
/// assert!(registry.add_external_type("Vector3"));
/// assert!(!registry.add_external_type("Vector3"));
///
/// let mut patches = PatchesDB::new();
/// registry.build(&mut patches).unwrap();
///
/// assert!(registry.find(ReflectId::of("Vector3")).is_some());
/// assert!(registry.find_serializable(ReflectId::of("Vector3")).is_none());
/// ```
pub struct TypesRegistry {
    external: NoOpHashMap<ReflectId, ReflectionType>,
    serializable: NoOpHashMap<ReflectId, SerializableReflectionType>,
    enums: NoOpHashMap<ReflectId, EnumReflectionType>,
    generic_enum: ReflectionType,
    built: bool,
}

impl Default for TypesRegistry {
    fn default() -> Self {
        Self {
            external: NoOpHashMap::default(),
            serializable: NoOpHashMap::default(),
            enums: NoOpHashMap::default(),
            generic_enum: ReflectionType::new(EnumReflectionType::GENERIC_NAME, 0),
            built: false,
        }
    }
}

impl TypesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_built(&self) -> bool {
        self.built
    }

    // -------------------------------------------------------------------------
    // Registration

    /// Registers `T`, returns `false` if its id is already taken.
    pub fn add_serializable_type<T: Reflected>(&mut self) -> bool {
        let mut builder = TypeBuilder::<T>::new();
        T::describe(&mut builder);
        self.add_type(builder.finish())
    }

    /// Registers a type assembled at runtime, returns `false` if its id is already taken.
    pub fn add_type(&mut self, ty: SerializableReflectionType) -> bool {
        if !self.can_register(ty.name(), ty.id()) {
            return false;
        }
        self.serializable.insert(ty.id(), ty);
        true
    }

    /// Registers a plain value shape, returns `false` if its id is already taken.
    pub fn add_external_type(&mut self, name: impl Into<String>) -> bool {
        let ty = ReflectionType::new(name, 0);
        if !self.can_register(ty.name(), ty.id()) {
            return false;
        }
        self.external.insert(ty.id(), ty);
        true
    }

    /// Registers the enum `E`, returns `false` if its id is already taken.
    #[inline]
    pub fn add_enum_type<E: ReflectedEnum>(&mut self) -> bool {
        self.add_enum(EnumReflectionType::of::<E>())
    }

    /// Registers an enum assembled at runtime, returns `false` if its id is already taken.
    pub fn add_enum(&mut self, ty: EnumReflectionType) -> bool {
        if !self.can_register(ty.name(), ty.id()) {
            return false;
        }
        self.enums.insert(ty.id(), ty);
        true
    }

    fn can_register(&self, name: &str, id: ReflectId) -> bool {
        if self.built {
            log::warn!("type `{name}` registered after the types registry was built");
            return false;
        }
        if let Some(existing) = self.find(id) {
            if existing.name() != name {
                log::warn!("type `{name}` collides with `{}` ({id})", existing.name());
            }
            return false;
        }
        true
    }

    /// Registers every type submitted with [`register_type!`](crate::register_type).
    ///
    /// Returns the number of newly registered types.
    #[cfg(feature = "auto_register")]
    pub fn auto_register(&mut self) -> usize {
        let before = self.serializable.len();
        for func in inventory::iter::<AutoRegisterFunc> {
            (func.0)(self);
        }
        self.serializable.len() - before
    }

    // -------------------------------------------------------------------------
    // Lookup

    /// Finds a type of any kind, including the generic enum type.
    pub fn find(&self, id: ReflectId) -> Option<&ReflectionType> {
        self.external
            .get(&id)
            .or_else(|| self.serializable.get(&id).map(SerializableReflectionType::ty))
            .or_else(|| self.enums.get(&id).map(EnumReflectionType::ty))
            .or_else(|| (id == self.generic_enum.id()).then_some(&self.generic_enum))
    }

    #[inline]
    pub fn find_by_name(&self, name: &str) -> Option<&ReflectionType> {
        self.find(ReflectId::of(name))
    }

    #[inline]
    pub fn find_serializable(&self, id: ReflectId) -> Option<&SerializableReflectionType> {
        self.serializable.get(&id)
    }

    #[inline]
    pub fn find_serializable_by_name(&self, name: &str) -> Option<&SerializableReflectionType> {
        self.find_serializable(ReflectId::of(name))
    }

    #[inline]
    pub fn find_enum(&self, id: ReflectId) -> Option<&EnumReflectionType> {
        self.enums.get(&id)
    }

    #[inline]
    pub fn find_enum_by_name(&self, name: &str) -> Option<&EnumReflectionType> {
        self.find_enum(ReflectId::of(name))
    }

    /// The type every enum derives from.
    #[inline]
    pub fn generic_enum_type(&self) -> &ReflectionType {
        &self.generic_enum
    }

    /// Mutable access for runtime type edits, refused once built.
    pub fn find_serializable_mut(&mut self, id: ReflectId) -> Option<&mut SerializableReflectionType> {
        if self.built {
            return None;
        }
        self.serializable.get_mut(&id)
    }

    /// Whether `type_id` is `base` or derives from it.
    pub fn is_a(&self, type_id: ReflectId, base: ReflectId) -> bool {
        type_id == base
            || self
                .find_serializable(type_id)
                .is_some_and(|ty| ty.is_a(base))
            || self.find_enum(type_id).is_some_and(|ty| ty.is_a(base))
    }

    /// Every serializable type that is `base` or derives from it, ordered by name.
    pub fn get_matching_serializable_types(
        &self,
        base: ReflectId,
        include_abstract: bool,
    ) -> Vec<&SerializableReflectionType> {
        let mut types: Vec<_> = self
            .serializable
            .values()
            .filter(|ty| ty.is_a(base) && (include_abstract || !ty.is_abstract()))
            .collect();
        types.sort_by(|a, b| a.name().cmp(b.name()));
        types
    }

    /// Direct parents of a type that are registered.
    pub fn collect_parents(&self, id: ReflectId) -> Vec<&SerializableReflectionType> {
        self.find_serializable(id)
            .map(|ty| {
                ty.parents()
                    .iter()
                    .filter_map(|p| self.find_serializable(p.id()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Concrete types deriving from `base`, excluding `base` itself.
    pub fn collect_implementations(&self, base: ReflectId) -> Vec<&SerializableReflectionType> {
        self.get_matching_serializable_types(base, false)
            .into_iter()
            .filter(|ty| ty.id() != base)
            .collect()
    }

    pub fn serializable_types(&self) -> impl Iterator<Item = &SerializableReflectionType> {
        self.serializable.values()
    }

    pub fn enum_types(&self) -> impl Iterator<Item = &EnumReflectionType> {
        self.enums.values()
    }

    /// Registered types, the generic enum type is not counted.
    pub fn len(&self) -> usize {
        self.external.len() + self.serializable.len() + self.enums.len()
    }

    /// Removes every type and allows building again.
    pub fn clear(&mut self) {
        self.external.clear();
        self.serializable.clear();
        self.enums.clear();
        self.built = false;
    }

    // -------------------------------------------------------------------------
    // Hierarchy walks

    /// Visits `type_id` and then its ancestors depth first.
    ///
    /// `f` receives each type with the part of `host` that type describes.
    /// A type reached through two paths is only visited once.
    pub fn map_types_hierarchy(
        &self,
        type_id: ReflectId,
        host: &dyn Any,
        f: &mut dyn FnMut(&SerializableReflectionType, &dyn Any) -> Result<()>,
    ) -> Result<()> {
        let mut visited = Vec::new();
        self.walk(type_id, host, f, &mut visited)
    }

    fn walk(
        &self,
        type_id: ReflectId,
        host: &dyn Any,
        f: &mut dyn FnMut(&SerializableReflectionType, &dyn Any) -> Result<()>,
        visited: &mut Vec<ReflectId>,
    ) -> Result<()> {
        if visited.contains(&type_id) {
            return Ok(());
        }
        visited.push(type_id);

        let ty = self
            .find_serializable(type_id)
            .ok_or(SerialError::UnknownType(type_id))?;
        f(ty, host)?;

        for parent in ty.parents() {
            match parent.project(host) {
                Some(part) => self.walk(parent.id(), part, f, visited)?,
                None => log::warn!("`{}` can not reach its parent {}", ty.name(), parent.id()),
            }
        }
        Ok(())
    }

    /// Mutable version of [`map_types_hierarchy`](Self::map_types_hierarchy).
    pub fn map_types_hierarchy_mut(
        &self,
        type_id: ReflectId,
        host: &mut dyn Any,
        f: &mut dyn FnMut(&SerializableReflectionType, &mut dyn Any) -> Result<()>,
    ) -> Result<()> {
        let mut visited = Vec::new();
        self.walk_mut(type_id, host, f, &mut visited)
    }

    fn walk_mut(
        &self,
        type_id: ReflectId,
        host: &mut dyn Any,
        f: &mut dyn FnMut(&SerializableReflectionType, &mut dyn Any) -> Result<()>,
        visited: &mut Vec<ReflectId>,
    ) -> Result<()> {
        if visited.contains(&type_id) {
            return Ok(());
        }
        visited.push(type_id);

        let ty = self
            .find_serializable(type_id)
            .ok_or(SerialError::UnknownType(type_id))?;
        f(ty, &mut *host)?;

        for parent in ty.parents() {
            match parent.project_mut(&mut *host) {
                Some(part) => self.walk_mut(parent.id(), part, f, visited)?,
                None => log::warn!("`{}` can not reach its parent {}", ty.name(), parent.id()),
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Build

    /// Finalizes the registry.
    ///
    /// - Resolves parent references at version `-1` to the parent's version.
    /// - Computes the ancestors of every type.
    /// - Seeds `patches` with an initial patch for every type lacking one.
    ///
    /// Must be called exactly once, after every type is registered.
    pub fn build(&mut self, patches: &mut PatchesDB) -> core::result::Result<(), RegistryError> {
        if self.built {
            return Err(RegistryError::AlreadyBuilt);
        }
        self.resolve_type_versions()?;
        self.compute_ancestors();
        for ty in self.serializable.values() {
            patches.add_initial_patch(ty);
        }
        self.built = true;
        Ok(())
    }

    fn resolve_type_versions(&mut self) -> core::result::Result<(), RegistryError> {
        let mut resolved = Vec::new();
        for ty in self.serializable.values() {
            for (index, parent) in ty.parents().iter().enumerate() {
                let Some(parent_ty) = self.serializable.get(&parent.id()) else {
                    return Err(RegistryError::UnknownParent {
                        child: String::from(ty.name()),
                        parent: parent.id(),
                    });
                };
                if parent.version() == crate::types::ParentTypeDesc::LATEST_VERSION {
                    resolved.push((ty.id(), index, parent_ty.version()));
                }
            }
        }
        for (id, index, version) in resolved {
            if let Some(ty) = self.serializable.get_mut(&id) {
                ty.resolve_parent_version(index, version);
            }
        }
        Ok(())
    }

    fn compute_ancestors(&mut self) {
        let mut all = Vec::with_capacity(self.serializable.len());
        for id in self.serializable.keys() {
            let mut ancestors = NoOpHashSet::default();
            let mut stack: Vec<ReflectId> = self.serializable[id]
                .parents()
                .iter()
                .map(|p| p.id())
                .collect();
            while let Some(parent) = stack.pop() {
                if ancestors.insert(parent)
                    && let Some(parent_ty) = self.serializable.get(&parent)
                {
                    stack.extend(parent_ty.parents().iter().map(|p| p.id()));
                }
            }
            all.push((*id, ancestors));
        }
        for (id, ancestors) in all {
            if let Some(ty) = self.serializable.get_mut(&id) {
                ty.set_ancestors(ancestors);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Auto register

/// A registration function collected by [`register_type!`](crate::register_type).
#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub struct AutoRegisterFunc(pub fn(&mut TypesRegistry));

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegisterFunc);

#[doc(hidden)]
pub fn register_one<T: Reflected>(registry: &mut TypesRegistry) {
    registry.add_serializable_type::<T>();
}

/// Submits a [`Reflected`] type for [`TypesRegistry::auto_register`].
///
/// ```ignore
/// vc_serial::register_type!(MyObject);
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! register_type {
    ($ty:ty) => {
        $crate::__macro_exports::inventory::submit! {
            $crate::types::AutoRegisterFunc($crate::types::register_one::<$ty>)
        }
    };
}

// -----------------------------------------------------------------------------
// Tests
