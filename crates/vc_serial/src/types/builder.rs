use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::marker::PhantomData;

use crate::ReflectId;
use crate::object::{Link, ReflectionObject, WeakLink};
use crate::stream::StreamValue;
use crate::types::codec::{
    EnumField, PointerArrayField, PointerField, ValueArrayField, ValueField, WeakPointerField,
};
use crate::types::reflection_type::FieldProjection;
use crate::types::{ParentTypeDesc, ReflectedEnum, SerializableReflectionType, TypeComponent};

// -----------------------------------------------------------------------------
// Reflected

/// A type that can describe its serializable layout.
///
/// Concrete object types also implement
/// [`ReflectionObject`](crate::object::ReflectionObject) and call
/// [`TypeBuilder::instantiable`]. Plain parts embedded in other types,
/// like a shared base struct, only implement `Reflected` and stay abstract.
///
/// # Examples
///
/// ```
/// use vc_serial::prelude::*;
///
/// #[derive(Default)]
/// struct Shape {
///     color: u32,
/// }
///
/// impl Reflected for Shape {
///     const TYPE_NAME: &'static str = "Shape";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.field("color", |s| &s.color, |s| &mut s.color)
///             .set_editable("Color");
///     }
/// }
///
/// #[derive(Default)]
/// struct Circle {
///     header: ObjectHeader,
///     shape: Shape,
///     radius: f32,
///     center: Link,
/// }
///
/// impl Reflected for Circle {
///     const TYPE_NAME: &'static str = "Circle";
///     const VERSION: i32 = 2;
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.instantiable();
///         ty.parent(|c| &c.shape, |c| &mut c.shape);
///         ty.field("radius", |c| &c.radius, |c| &mut c.radius);
///         ty.pointer("center", |c| &c.center, |c| &mut c.center);
///     }
/// }
///
/// impl ReflectionObject for Circle {
///     fn header(&self) -> &ObjectHeader { &self.header }
///     fn header_mut(&mut self) -> &mut ObjectHeader { &mut self.header }
/// }
///
/// let context = SerialContext::builder()
///     .with_type::<Shape>()
///     .with_type::<Circle>()
///     .build()
///     .unwrap();
///
/// let circle = context.registry().find_serializable_by_name("Circle").unwrap();
/// assert_eq!(circle.version(), 2);
/// assert!(circle.is_a(ReflectId::of("Shape")));
/// ```
pub trait Reflected: Any + Send + Sync + Sized {
    /// The registered name, its hash is the archived type id.
    const TYPE_NAME: &'static str;

    /// The schema generation.
    const VERSION: i32 = 0;

    fn describe(ty: &mut TypeBuilder<Self>);
}

fn instantiate_default<T: ReflectionObject + Default>() -> Box<dyn ReflectionObject> {
    Box::new(T::default())
}

// -----------------------------------------------------------------------------
// TypeBuilder

/// Collects the layout of a [`Reflected`] type.
///
/// Field accessors are plain function pointers, non-capturing closures
/// such as `|s| &s.value` coerce to them.
pub struct TypeBuilder<T> {
    ty: SerializableReflectionType,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflected> TypeBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            ty: SerializableReflectionType::new(T::TYPE_NAME, T::VERSION),
            _marker: PhantomData,
        }
    }

    pub(crate) fn finish(self) -> SerializableReflectionType {
        self.ty
    }

    #[inline]
    fn owner(&self) -> ReflectId {
        self.ty.id()
    }

    /// Makes the type concrete, instances are created with `Default`.
    pub fn instantiable(&mut self) -> &mut Self
    where
        T: ReflectionObject + Default,
    {
        self.ty.set_instantiator(Some(instantiate_default::<T>));
        self
    }

    /// Declares a parent type stored as a part of `T`.
    ///
    /// The parent is referenced at its latest version.
    pub fn parent<P: Reflected>(&mut self, get: fn(&T) -> &P, get_mut: fn(&mut T) -> &mut P) -> &mut Self {
        self.ty.add_projected_base_type(
            ReflectId::of(P::TYPE_NAME),
            ParentTypeDesc::LATEST_VERSION,
            Arc::new(FieldProjection { get, get_mut }),
        );
        self
    }

    /// Declares a parent type whose fields are read from `T` itself.
    pub fn interface(&mut self, name: &str, version: i32) -> &mut Self {
        self.ty.add_base_type(ReflectId::of(name), version);
        self
    }

    /// Adds a field stored by value.
    pub fn field<F: StreamValue>(
        &mut self,
        name: impl Into<String>,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut TypeComponent {
        let owner = self.owner();
        self.ty.add_member_field(TypeComponent::new(
            name,
            owner,
            Box::new(ValueField::new(get, get_mut)),
        ))
    }

    /// Adds an enum field stored as the value of its enumerator.
    pub fn enumeration<E: ReflectedEnum>(
        &mut self,
        name: impl Into<String>,
        get: fn(&T) -> &E,
        get_mut: fn(&mut T) -> &mut E,
    ) -> &mut TypeComponent {
        let owner = self.owner();
        self.ty.add_member_field(TypeComponent::new(
            name,
            owner,
            Box::new(EnumField::new(get, get_mut)),
        ))
    }

    /// Adds a `Vec` field whose elements are stored by value.
    pub fn array<F: StreamValue>(
        &mut self,
        name: impl Into<String>,
        get: fn(&T) -> &Vec<F>,
        get_mut: fn(&mut T) -> &mut Vec<F>,
    ) -> &mut TypeComponent {
        let owner = self.owner();
        self.ty.add_member_field(TypeComponent::new(
            name,
            owner,
            Box::new(ValueArrayField::new(get, get_mut)),
        ))
    }

    /// Adds an owning pointer field.
    pub fn pointer(
        &mut self,
        name: impl Into<String>,
        get: fn(&T) -> &Link,
        get_mut: fn(&mut T) -> &mut Link,
    ) -> &mut TypeComponent {
        let owner = self.owner();
        self.ty.add_member_field(TypeComponent::new(
            name,
            owner,
            Box::new(PointerField::new(get, get_mut)),
        ))
    }

    /// Adds a back reference, it carries [`ComponentTraits::REFERENCE`](crate::types::ComponentTraits::REFERENCE).
    pub fn weak_pointer(
        &mut self,
        name: impl Into<String>,
        get: fn(&T) -> &WeakLink,
        get_mut: fn(&mut T) -> &mut WeakLink,
    ) -> &mut TypeComponent {
        let owner = self.owner();
        self.ty.add_member_field(TypeComponent::new(
            name,
            owner,
            Box::new(WeakPointerField::new(get, get_mut)),
        ))
    }

    /// Adds a `Vec` of owning pointers.
    pub fn pointer_array(
        &mut self,
        name: impl Into<String>,
        get: fn(&T) -> &Vec<Link>,
        get_mut: fn(&mut T) -> &mut Vec<Link>,
    ) -> &mut TypeComponent {
        let owner = self.owner();
        self.ty.add_member_field(TypeComponent::new(
            name,
            owner,
            Box::new(PointerArrayField::new(get, get_mut)),
        ))
    }
}
