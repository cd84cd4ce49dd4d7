use crate::DependencyIndex;
use crate::dependency::LinkTarget;
use crate::object::{ObjectRef, WeakObjectRef};

// -----------------------------------------------------------------------------
// Link

/// An owning pointer field.
///
/// Right after loading, a link may still hold the compressed index it was
/// saved with. Dependency linking replaces it with the live object.
#[derive(Debug, Clone, Default)]
pub enum Link {
    #[default]
    Null,
    Bound(ObjectRef),
    Unresolved(DependencyIndex),
}

impl Link {
    #[inline]
    pub fn new(object: ObjectRef) -> Self {
        Self::Bound(object)
    }

    #[inline]
    pub fn from_option(object: Option<ObjectRef>) -> Self {
        object.map_or(Self::Null, Self::Bound)
    }

    /// The target, if the link is bound.
    #[inline]
    pub fn get(&self) -> Option<&ObjectRef> {
        match self {
            Self::Bound(object) => Some(object),
            _ => None,
        }
    }

    #[inline]
    pub fn set(&mut self, object: Option<ObjectRef>) {
        *self = Self::from_option(object);
    }

    #[inline]
    pub fn take(&mut self) -> Option<ObjectRef> {
        match core::mem::take(self) {
            Self::Bound(object) => Some(object),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The saved index of a link that was not linked yet.
    #[inline]
    pub fn unresolved_index(&self) -> Option<DependencyIndex> {
        match self {
            Self::Unresolved(index) => Some(*index),
            _ => None,
        }
    }

    /// Whether both links point to the same object.
    pub fn points_to(&self, object: &ObjectRef) -> bool {
        self.get().is_some_and(|target| target.ptr_eq(object))
    }

    pub(crate) fn from_index(index: DependencyIndex) -> Self {
        if index.is_null() {
            Self::Null
        } else {
            Self::Unresolved(index)
        }
    }

    pub(crate) fn restore(&mut self, target: LinkTarget) {
        *self = match target {
            LinkTarget::Null => Self::Null,
            LinkTarget::Object(object) => Self::Bound(object),
            LinkTarget::Pending(index) => Self::from_index(index),
        };
    }
}

impl From<ObjectRef> for Link {
    #[inline]
    fn from(object: ObjectRef) -> Self {
        Self::Bound(object)
    }
}

// -----------------------------------------------------------------------------
// WeakLink

/// A non-owning pointer field, used for back references.
///
/// Weak links are followed when mapping dependencies, so their targets
/// are saved too, but they never keep their target alive.
#[derive(Debug, Clone, Default)]
pub enum WeakLink {
    #[default]
    Null,
    Bound(WeakObjectRef),
    Unresolved(DependencyIndex),
}

impl WeakLink {
    #[inline]
    pub fn new(object: &ObjectRef) -> Self {
        Self::Bound(object.downgrade())
    }

    /// The target, if the link is bound and the target is alive.
    pub fn upgrade(&self) -> Option<ObjectRef> {
        match self {
            Self::Bound(object) => object.upgrade(),
            _ => None,
        }
    }

    #[inline]
    pub fn set(&mut self, object: Option<&ObjectRef>) {
        *self = object.map_or(Self::Null, Self::new);
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn unresolved_index(&self) -> Option<DependencyIndex> {
        match self {
            Self::Unresolved(index) => Some(*index),
            _ => None,
        }
    }

    pub(crate) fn from_index(index: DependencyIndex) -> Self {
        if index.is_null() {
            Self::Null
        } else {
            Self::Unresolved(index)
        }
    }

    pub(crate) fn restore(&mut self, target: LinkTarget) {
        *self = match target {
            LinkTarget::Null => Self::Null,
            LinkTarget::Object(object) => Self::new(&object),
            LinkTarget::Pending(index) => Self::from_index(index),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_types::TestNode;

    #[test]
    fn links_restore_from_targets() {
        let node = ObjectRef::new(TestNode::named("n", 1));

        let mut link = Link::from_index(DependencyIndex::NULL);
        assert!(link.is_null());

        link = Link::from_index(DependencyIndex::external(0));
        assert_eq!(link.unresolved_index(), Some(DependencyIndex::external(0)));
        link.restore(LinkTarget::Object(node.clone()));
        assert!(link.points_to(&node));
        assert_eq!(link.take().map(|o| o.ptr_eq(&node)), Some(true));
        assert!(link.is_null());
    }

    #[test]
    fn weak_links_do_not_own() {
        let node = ObjectRef::new(TestNode::named("n", 1));
        let mut weak = WeakLink::default();
        weak.restore(LinkTarget::Object(node.clone()));
        assert_eq!(node.references_count(), 1);
        assert!(weak.upgrade().is_some());

        drop(node);
        assert!(weak.upgrade().is_none());
        assert!(!weak.is_null());

        weak.set(None);
        assert!(weak.is_null());
    }
}
