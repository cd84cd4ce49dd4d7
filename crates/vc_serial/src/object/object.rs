use core::any::Any;

use crate::ReflectId;
use crate::fs::FilePath;
use crate::object::ObjectHeader;
use crate::types::Reflected;

// -----------------------------------------------------------------------------
// ReflectAny

/// Dynamic access to a reflected value.
///
/// Implemented automatically for every [`Reflected`] type.
pub trait ReflectAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The registered type id of the concrete type.
    fn type_uid(&self) -> ReflectId;

    /// The registered name of the concrete type.
    fn reflect_type_name(&self) -> &'static str;
}

impl<T: Reflected> ReflectAny for T {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline(always)]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn type_uid(&self) -> ReflectId {
        ReflectId::of(T::TYPE_NAME)
    }

    #[inline(always)]
    fn reflect_type_name(&self) -> &'static str {
        T::TYPE_NAME
    }
}

// -----------------------------------------------------------------------------
// ReflectionObject

/// A serializable instance.
///
/// Objects are shared through [`ObjectRef`](crate::object::ObjectRef). When
/// an object is saved, every object reachable through its pointer fields is
/// saved with it, unless it is a [`Resource`].
///
/// # Examples
///
/// ```
/// use vc_serial::prelude::*;
///
/// #[derive(Default)]
/// struct Note {
///     header: ObjectHeader,
///     text: String,
/// }
///
/// impl Reflected for Note {
///     const TYPE_NAME: &'static str = "Note";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.instantiable();
///         ty.field("text", |n| &n.text, |n| &mut n.text);
///     }
/// }
///
/// impl ReflectionObject for Note {
///     fn header(&self) -> &ObjectHeader { &self.header }
///     fn header_mut(&mut self) -> &mut ObjectHeader { &mut self.header }
/// }
///
/// let note = ObjectRef::new(Note::default());
/// assert_eq!(note.type_uid(), ReflectId::of("Note"));
/// ```
pub trait ReflectionObject: ReflectAny {
    fn header(&self) -> &ObjectHeader;

    fn header_mut(&mut self) -> &mut ObjectHeader;

    /// Called once per save, before the object's fields are mapped.
    fn on_object_pre_save(&mut self) {}

    /// Called after a whole load batch finished and every pointer is linked.
    fn on_object_loaded(&mut self) {}

    /// Returns `Some` for objects that live in their own files.
    fn as_resource(&self) -> Option<&dyn Resource> {
        None
    }
}

// -----------------------------------------------------------------------------
// Resource

/// An object stored in its own file.
///
/// Other archives only store its [`FilePath`].
pub trait Resource: ReflectionObject {
    fn file_path(&self) -> &FilePath;
}
