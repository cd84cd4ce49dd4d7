use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::fmt;
use std::sync::{Mutex, PoisonError};

use crate::object::UniqueId;

// -----------------------------------------------------------------------------
// ObjectListener

/// Observes property changes of objects it is attached to.
///
/// Listeners are held weakly, dropping the last `Arc` detaches them.
pub trait ObjectListener: Send + Sync {
    fn on_pre_property_changed(&self, _object: &UniqueId, _property: &str) {}

    fn on_property_changed(&self, _object: &UniqueId, _property: &str) {}

    /// The observed object is being destroyed.
    fn on_observed_object_deleted(&self, _object: &UniqueId) {}
}

// -----------------------------------------------------------------------------
// ObjectHeader

/// Data every [`ReflectionObject`](crate::object::ReflectionObject) carries.
///
/// The listener list can be changed through a shared reference, so
/// listeners may attach to an object that is only read locked.
#[derive(Default)]
pub struct ObjectHeader {
    unique_id: UniqueId,
    listeners: Mutex<Vec<Weak<dyn ObjectListener>>>,
}

impl ObjectHeader {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique_id(id: impl Into<UniqueId>) -> Self {
        Self {
            unique_id: id.into(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn unique_id(&self) -> &UniqueId {
        &self.unique_id
    }

    #[inline]
    pub fn set_unique_id(&mut self, id: UniqueId) {
        self.unique_id = id;
    }

    /// Attaches a listener, attaching the same listener twice has no effect.
    pub fn attach_listener(&self, listener: &Arc<dyn ObjectListener>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let target = Arc::as_ptr(listener);
        if !listeners.iter().any(|l| core::ptr::addr_eq(l.as_ptr(), target)) {
            listeners.push(Arc::downgrade(listener));
        }
    }

    pub fn detach_listener(&self, listener: &Arc<dyn ObjectListener>) {
        let target = Arc::as_ptr(listener);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|l| !core::ptr::addr_eq(l.as_ptr(), target));
    }

    /// Number of listeners still alive.
    pub fn listeners_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    pub fn notify_pre_property_change(&self, property: &str) {
        for listener in self.live_listeners() {
            listener.on_pre_property_changed(&self.unique_id, property);
        }
    }

    pub fn notify_property_change(&self, property: &str) {
        for listener in self.live_listeners() {
            listener.on_property_changed(&self.unique_id, property);
        }
    }

    // Listeners run without the lock held, they may detach themselves.
    fn live_listeners(&self) -> Vec<Arc<dyn ObjectListener>> {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|l| l.strong_count() > 0);
        listeners.iter().filter_map(Weak::upgrade).collect()
    }
}

impl Drop for ObjectHeader {
    fn drop(&mut self) {
        let listeners = core::mem::take(
            self.listeners
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for listener in listeners.iter().filter_map(Weak::upgrade) {
            listener.on_observed_object_deleted(&self.unique_id);
        }
    }
}

impl fmt::Debug for ObjectHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeader")
            .field("unique_id", &self.unique_id)
            .field("listeners", &self.listeners_count())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ObjectListener for Recorder {
        fn on_pre_property_changed(&self, object: &UniqueId, property: &str) {
            self.events.lock().unwrap().push(format!("pre {object}.{property}"));
        }

        fn on_property_changed(&self, object: &UniqueId, property: &str) {
            self.events.lock().unwrap().push(format!("post {object}.{property}"));
        }

        fn on_observed_object_deleted(&self, object: &UniqueId) {
            self.events.lock().unwrap().push(format!("deleted {object}"));
        }
    }

    #[test]
    fn listeners_receive_notifications() {
        let recorder = Arc::new(Recorder::default());
        let listener: Arc<dyn ObjectListener> = recorder.clone();

        let header = ObjectHeader::with_unique_id("obj");
        header.attach_listener(&listener);
        header.attach_listener(&listener);
        assert_eq!(header.listeners_count(), 1);

        header.notify_pre_property_change("value");
        header.notify_property_change("value");
        drop(header);

        let events = recorder.events.lock().unwrap();
        assert_eq!(*events, ["pre obj.value", "post obj.value", "deleted obj"]);
    }

    #[test]
    fn detached_and_dropped_listeners_are_skipped() {
        let recorder = Arc::new(Recorder::default());
        let listener: Arc<dyn ObjectListener> = recorder.clone();
        let header = ObjectHeader::with_unique_id("obj");

        header.attach_listener(&listener);
        header.detach_listener(&listener);
        header.notify_property_change("value");
        assert!(recorder.events.lock().unwrap().is_empty());

        header.attach_listener(&listener);
        drop(listener);
        drop(recorder);
        assert_eq!(header.listeners_count(), 0);
    }
}
