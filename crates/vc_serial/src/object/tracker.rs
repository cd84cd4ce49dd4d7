use vc_utils::hash::HashMap;

use crate::object::{ObjectRef, UniqueId};

// -----------------------------------------------------------------------------
// ObjectsTracker

/// Finds live objects by [`UniqueId`] while loading.
///
/// When a loader finds a tracked instance for an archived object, the
/// instance is reused and the archived payload is skipped.
pub trait ObjectsTracker {
    fn find_instance(&self, id: &UniqueId) -> Option<ObjectRef>;

    fn track_instance(&mut self, object: &ObjectRef);
}

// -----------------------------------------------------------------------------
// DefaultObjectsTracker

/// An [`ObjectsTracker`] keeping strong references to every tracked object.
///
/// Objects with an empty unique id are never tracked.
#[derive(Default)]
pub struct DefaultObjectsTracker {
    instances: HashMap<UniqueId, ObjectRef>,
}

impl DefaultObjectsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn untrack(&mut self, id: &UniqueId) -> Option<ObjectRef> {
        self.instances.remove(id)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }
}

impl ObjectsTracker for DefaultObjectsTracker {
    fn find_instance(&self, id: &UniqueId) -> Option<ObjectRef> {
        if id.is_empty() {
            return None;
        }
        self.instances.get(id).cloned()
    }

    fn track_instance(&mut self, object: &ObjectRef) {
        let id = object.unique_id();
        if id.is_empty() {
            return;
        }
        if let Some(previous) = self.instances.insert(id, object.clone())
            && !previous.ptr_eq(object)
        {
            log::warn!("tracked object `{}` was replaced by another instance", object.unique_id());
        }
    }
}
