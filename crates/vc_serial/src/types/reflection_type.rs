use alloc::string::String;
use alloc::sync::Arc;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use vc_utils::hash::NoOpHashSet;

use crate::ReflectId;
use crate::object::ReflectionObject;
use crate::types::{ComponentTraits, TypeComponent};

// -----------------------------------------------------------------------------
// ReflectionType

/// Identifies a reflectable shape.
///
/// The id is derived from the name and is what archives store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionType {
    name: String,
    id: ReflectId,
    version_no: i32,
}

impl ReflectionType {
    pub fn new(name: impl Into<String>, version_no: i32) -> Self {
        let name = name.into();
        Self {
            id: ReflectId::of(&name),
            name,
            version_no,
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

    /// The schema generation of the type.
    #[inline]
    pub fn version(&self) -> i32 {
        self.version_no
    }
}

// -----------------------------------------------------------------------------
// PartProjection

/// Projects a host value onto the part a parent type describes.
pub(crate) trait PartProjection: Send + Sync {
    fn project<'a>(&self, host: &'a dyn Any) -> Option<&'a dyn Any>;

    fn project_mut<'a>(&self, host: &'a mut dyn Any) -> Option<&'a mut dyn Any>;
}

pub(crate) struct FieldProjection<H, P> {
    pub(crate) get: fn(&H) -> &P,
    pub(crate) get_mut: fn(&mut H) -> &mut P,
}

impl<H: 'static, P: 'static> PartProjection for FieldProjection<H, P> {
    fn project<'a>(&self, host: &'a dyn Any) -> Option<&'a dyn Any> {
        host.downcast_ref::<H>().map(|h| (self.get)(h) as &dyn Any)
    }

    fn project_mut<'a>(&self, host: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        host.downcast_mut::<H>().map(|h| (self.get_mut)(h) as &mut dyn Any)
    }
}

// -----------------------------------------------------------------------------
// ParentTypeDesc

/// A reference to a base type.
///
/// A version of `-1` stands for "latest" until the registry is built.
/// Without a projection the parent's fields are read from the same host.
#[derive(Clone)]
pub struct ParentTypeDesc {
    id: ReflectId,
    version: i32,
    projection: Option<Arc<dyn PartProjection>>,
}

impl ParentTypeDesc {
    pub const LATEST_VERSION: i32 = -1;

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.id
    }

    #[inline]
    pub fn version(&self) -> i32 {
        self.version
    }

    pub(crate) fn project<'a>(&self, host: &'a dyn Any) -> Option<&'a dyn Any> {
        match &self.projection {
            Some(projection) => projection.project(host),
            None => Some(host),
        }
    }

    pub(crate) fn project_mut<'a>(&self, host: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        match &self.projection {
            Some(projection) => projection.project_mut(host),
            None => Some(host),
        }
    }
}

impl fmt::Debug for ParentTypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentTypeDesc")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("projected", &self.projection.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// SerializableReflectionType

pub type Instantiator = fn() -> Box<dyn ReflectionObject>;

/// A type taking full part in serialization.
///
/// Owns the ordered member fields, the base type references and, for
/// concrete types, the instantiator. Types without an instantiator are
/// abstract.
pub struct SerializableReflectionType {
    ty: ReflectionType,
    components: Vec<TypeComponent>,
    parents: Vec<ParentTypeDesc>,
    instantiator: Option<Instantiator>,
    ancestors: NoOpHashSet<ReflectId>,
}

impl SerializableReflectionType {
    pub fn new(name: impl Into<String>, version_no: i32) -> Self {
        Self {
            ty: ReflectionType::new(name, version_no),
            components: Vec::new(),
            parents: Vec::new(),
            instantiator: None,
            ancestors: NoOpHashSet::default(),
        }
    }

    #[inline]
    pub fn ty(&self) -> &ReflectionType {
        &self.ty
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.ty.id()
    }

    #[inline]
    pub fn version(&self) -> i32 {
        self.ty.version()
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.instantiator.is_none()
    }

    #[inline]
    pub fn instantiator(&self) -> Option<Instantiator> {
        self.instantiator
    }

    pub fn set_instantiator(&mut self, instantiator: Option<Instantiator>) {
        self.instantiator = instantiator;
    }

    /// Creates a new instance, `None` for abstract types.
    pub fn instantiate(&self) -> Option<Box<dyn ReflectionObject>> {
        self.instantiator.map(|create| create())
    }

    // -------------------------------------------------------------------------
    // Members

    #[inline]
    pub fn components(&self) -> &[TypeComponent] {
        &self.components
    }

    /// Adds a member field, a field with the same id is replaced.
    pub fn add_member_field(&mut self, component: TypeComponent) -> &mut TypeComponent {
        let index = match self.components.iter().position(|c| c.id() == component.id()) {
            Some(index) => {
                log::warn!(
                    "type `{}` redeclares member `{}`",
                    self.name(),
                    component.name()
                );
                self.components[index] = component;
                index
            }
            None => {
                self.components.push(component);
                self.components.len() - 1
            }
        };
        &mut self.components[index]
    }

    pub fn remove_member_field(&mut self, id: ReflectId) -> Option<TypeComponent> {
        let index = self.components.iter().position(|c| c.id() == id)?;
        Some(self.components.remove(index))
    }

    pub fn find_member_field(&self, id: ReflectId) -> Option<&TypeComponent> {
        self.components.iter().find(|c| c.id() == id)
    }

    #[inline]
    pub fn find_member_field_by_name(&self, name: &str) -> Option<&TypeComponent> {
        self.find_member_field(ReflectId::of(name))
    }

    /// Member fields declared by this type that carry every one of `traits`.
    pub fn collect_member_fields(&self, traits: ComponentTraits) -> Vec<&TypeComponent> {
        self.components
            .iter()
            .filter(|c| c.has_traits(traits))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Parents

    #[inline]
    pub fn parents(&self) -> &[ParentTypeDesc] {
        &self.parents
    }

    /// Adds a base type whose fields live in the same host.
    ///
    /// Adding the same base twice has no effect.
    pub fn add_base_type(&mut self, id: ReflectId, version: i32) {
        self.push_parent(ParentTypeDesc {
            id,
            version,
            projection: None,
        });
    }

    pub(crate) fn add_projected_base_type(
        &mut self,
        id: ReflectId,
        version: i32,
        projection: Arc<dyn PartProjection>,
    ) {
        self.push_parent(ParentTypeDesc {
            id,
            version,
            projection: Some(projection),
        });
    }

    fn push_parent(&mut self, parent: ParentTypeDesc) {
        if self.parents.iter().all(|p| p.id != parent.id) {
            self.parents.push(parent);
        }
    }

    pub fn remove_base_type(&mut self, id: ReflectId) -> bool {
        let before = self.parents.len();
        self.parents.retain(|p| p.id != id);
        before != self.parents.len()
    }

    pub(crate) fn resolve_parent_version(&mut self, index: usize, version: i32) {
        self.parents[index].version = version;
    }

    // -------------------------------------------------------------------------
    // Ancestry

    /// Whether this type is `base` or derives from it.
    ///
    /// Ancestry is computed when the registry is built; before that only
    /// the type itself and its direct parents are known.
    pub fn is_a(&self, base: ReflectId) -> bool {
        self.id() == base
            || self.ancestors.contains(&base)
            || self.parents.iter().any(|p| p.id == base)
    }

    #[inline]
    pub fn is_exactly_a(&self, id: ReflectId) -> bool {
        self.id() == id
    }

    /// Every ancestor id, available once the registry is built.
    pub fn ancestors(&self) -> impl Iterator<Item = ReflectId> + '_ {
        self.ancestors.iter().copied()
    }

    pub(crate) fn set_ancestors(&mut self, ancestors: NoOpHashSet<ReflectId>) {
        self.ancestors = ancestors;
    }
}

impl fmt::Debug for SerializableReflectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializableReflectionType")
            .field("name", &self.name())
            .field("id", &self.id())
            .field("version", &self.version())
            .field("parents", &self.parents)
            .field("components", &self.components)
            .field("abstract", &self.is_abstract())
            .finish()
    }
}
