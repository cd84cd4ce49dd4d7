use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use core::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ReflectId;
use crate::fs::FilePath;
use crate::object::{ReflectionObject, UniqueId};
use crate::types::TypesRegistry;

// -----------------------------------------------------------------------------
// ObjectCell

struct ObjectCell {
    type_id: ReflectId,
    is_resource: bool,
    object: RwLock<Box<dyn ReflectionObject>>,
}

// -----------------------------------------------------------------------------
// ObjectRef

/// Shared ownership of a [`ReflectionObject`].
///
/// The reference count is atomic and the object is destroyed with the
/// last reference. Access goes through a read/write lock, so objects can
/// be shared between threads.
///
/// Identity is the allocation: two `ObjectRef`s are the same object
/// if [`ptr_eq`](ObjectRef::ptr_eq) holds.
#[derive(Clone)]
pub struct ObjectRef(Arc<ObjectCell>);

impl ObjectRef {
    pub fn new<T: ReflectionObject>(object: T) -> Self {
        Self::from_boxed(Box::new(object))
    }

    pub fn from_boxed(object: Box<dyn ReflectionObject>) -> Self {
        Self(Arc::new(ObjectCell {
            type_id: object.type_uid(),
            is_resource: object.as_resource().is_some(),
            object: RwLock::new(object),
        }))
    }

    /// The registered type id of the object, readable without locking.
    #[inline]
    pub fn type_uid(&self) -> ReflectId {
        self.0.type_id
    }

    /// Whether the object is a [`Resource`](crate::object::Resource).
    #[inline]
    pub fn is_resource(&self) -> bool {
        self.0.is_resource
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn ReflectionObject>> {
        self.0.object.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn ReflectionObject>> {
        self.0.object.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the object if its concrete type is `T`.
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        guard.as_any().downcast_ref::<T>().map(f)
    }

    /// Runs `f` on the object mutably if its concrete type is `T`.
    pub fn with_mut<T: 'static, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        guard.as_any_mut().downcast_mut::<T>().map(f)
    }

    pub fn unique_id(&self) -> UniqueId {
        self.read().header().unique_id().clone()
    }

    /// The file path of a resource object.
    pub fn resource_path(&self) -> Option<FilePath> {
        if !self.is_resource() {
            return None;
        }
        self.read().as_resource().map(|r| r.file_path().clone())
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of strong references, including this one.
    #[inline]
    pub fn references_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    #[inline]
    pub fn downgrade(&self) -> WeakObjectRef {
        WeakObjectRef(Arc::downgrade(&self.0))
    }

    /// Whether the object's type is `base` or derives from it.
    pub fn is_a(&self, registry: &TypesRegistry, base: ReflectId) -> bool {
        registry.is_a(self.type_uid(), base)
    }

    #[inline]
    pub fn is_exactly_a(&self, type_id: ReflectId) -> bool {
        self.type_uid() == type_id
    }

    /// An address that identifies the object while it is alive.
    #[inline]
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("type", &self.type_uid())
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// WeakObjectRef

/// A non-owning [`ObjectRef`].
#[derive(Clone, Default)]
pub struct WeakObjectRef(Weak<ObjectCell>);

impl WeakObjectRef {
    #[inline]
    pub fn new() -> Self {
        Self(Weak::new())
    }

    #[inline]
    pub fn upgrade(&self) -> Option<ObjectRef> {
        self.0.upgrade().map(ObjectRef)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for WeakObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(object) => write!(f, "WeakObjectRef({object:?})"),
            None => f.write_str("WeakObjectRef(<dropped>)"),
        }
    }
}
