use alloc::vec::Vec;
use core::any::Any;
use core::cell::Cell;

use vc_utils::hash::HashMap;

use crate::dependency::{DependencyLinker, LinkTarget};
use crate::fs::FilePath;
use crate::object::ObjectRef;
use crate::types::{SerializableReflectionType, TypesRegistry};
use crate::{DependencyIndex, DependencySlot};

// -----------------------------------------------------------------------------
// FindResourceDelegate

/// Looks up a loaded resource by path.
pub trait FindResourceDelegate {
    fn find_resource(&self, path: &FilePath) -> Option<ObjectRef>;
}

impl<F> FindResourceDelegate for F
where
    F: Fn(&FilePath) -> Option<ObjectRef>,
{
    #[inline]
    fn find_resource(&self, path: &FilePath) -> Option<ObjectRef> {
        self(path)
    }
}

// -----------------------------------------------------------------------------
// ExternalDependenciesLinker

/// Binds links that still hold an external dependency index.
///
/// `remap` is the list filled by
/// [`ReflectionLoader::deserialize`](crate::dependency::ReflectionLoader::deserialize)
/// over a whole loading session.
///
/// The delegate is queried before any object is locked, so it may inspect
/// the objects being linked.
///
/// # Examples
///
/// ```ignore
/// let find = |path: &FilePath| resources.get(path).cloned();
/// let linker = ExternalDependenciesLinker::new(context.registry(), &remap, &find);
/// linker.link(loader.all_loaded_objects());
/// ```
pub struct ExternalDependenciesLinker<'a> {
    registry: &'a TypesRegistry,
    remap: &'a [FilePath],
    delegate: &'a dyn FindResourceDelegate,
}

impl<'a> ExternalDependenciesLinker<'a> {
    pub fn new(
        registry: &'a TypesRegistry,
        remap: &'a [FilePath],
        delegate: &'a dyn FindResourceDelegate,
    ) -> Self {
        Self {
            registry,
            remap,
            delegate,
        }
    }

    /// Links every object of `objects`, returns the number of bound links.
    pub fn link(&self, objects: &[ObjectRef]) -> usize {
        let resolved = self.resolve_all();
        for object in objects {
            let mut guard = object.write();
            let result = self.registry.map_types_hierarchy_mut(
                object.type_uid(),
                guard.as_any_mut(),
                &mut |ty: &SerializableReflectionType, host: &mut dyn Any| {
                    for component in ty.components() {
                        component.restore_dependencies(&mut *host, &resolved);
                    }
                    Ok(())
                },
            );
            if let Err(err) = result {
                log::warn!("can not link {object:?}: {err}");
            }
        }
        resolved.bound.get()
    }

    fn resolve_all(&self) -> ResolvedResources<'a> {
        let mut cache: HashMap<&FilePath, Option<ObjectRef>> = HashMap::default();
        let resources = self
            .remap
            .iter()
            .map(|path| {
                cache
                    .entry(path)
                    .or_insert_with(|| self.delegate.find_resource(path))
                    .clone()
            })
            .collect();
        ResolvedResources {
            remap: self.remap,
            resources,
            bound: Cell::new(0),
        }
    }
}

/// Resources looked up once per remap entry.
struct ResolvedResources<'a> {
    remap: &'a [FilePath],
    resources: Vec<Option<ObjectRef>>,
    bound: Cell<usize>,
}

impl DependencyLinker for ResolvedResources<'_> {
    fn find_dependency(&self, index: DependencyIndex) -> LinkTarget {
        match index.decode() {
            DependencySlot::Null => LinkTarget::Null,
            DependencySlot::Internal(_) => LinkTarget::Pending(index),
            DependencySlot::External(slot) => match self.resources.get(slot) {
                None => {
                    log::warn!("external dependency {index:?} is out of range");
                    LinkTarget::Null
                }
                Some(Some(resource)) => {
                    self.bound.set(self.bound.get() + 1);
                    LinkTarget::Object(resource.clone())
                }
                Some(None) => {
                    log::warn!("resource `{}` is not loaded, leaving the link null", self.remap[slot]);
                    LinkTarget::Null
                }
            },
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::{ExternalDependencies, ReflectionLoader, ReflectionSaver};
    use crate::stream::{InRawArrayStream, OutArrayStream};
    use crate::test_types::{TestAtlas, TestMaterial, TestNode, TestTexture, test_context};

    #[test]
    fn links_resources_by_path() {
        let context = test_context();
        let wall = ObjectRef::new(TestTexture::new("wall.png"));
        let floor = ObjectRef::new(TestTexture::new("floor.png"));
        let material = ObjectRef::new(TestMaterial::new("mat", &wall, &floor));
        let node = ObjectRef::new(TestNode::named("node", 1).with_next(&wall));

        let mut first = Vec::new();
        let mut second = Vec::new();
        {
            let mut out = OutArrayStream::new(&mut first);
            ReflectionSaver::new(&context, &mut out).save(&material).unwrap();
        }
        {
            let mut out = OutArrayStream::new(&mut second);
            ReflectionSaver::new(&context, &mut out).save(&node).unwrap();
        }

        let mut to_load = Vec::new();
        let mut remap = Vec::new();
        let mut loader = ReflectionLoader::new(&context);
        for bytes in [&first, &second] {
            let externals = ExternalDependencies::new(&mut to_load, &mut remap);
            loader.deserialize(&mut InRawArrayStream::new(bytes), Some(externals)).unwrap();
        }
        assert_eq!(to_load, [FilePath::new("wall.png"), FilePath::new("floor.png")]);
        assert_eq!(remap.len(), 3);

        let resources = [wall.clone(), floor.clone()];
        let find = |path: &FilePath| {
            resources
                .iter()
                .find(|r| r.resource_path().as_ref() == Some(path))
                .cloned()
        };
        let linker = ExternalDependenciesLinker::new(context.registry(), &remap, &find);
        assert_eq!(linker.link(loader.all_loaded_objects()), 3);

        let material = loader.next_object().unwrap();
        let node = loader.next_object().unwrap();
        material
            .with(|m: &TestMaterial| {
                assert!(m.diffuse.points_to(&wall));
                assert!(m.normal.points_to(&floor));
            })
            .unwrap();
        assert!(node.with(|n: &TestNode| n.next.points_to(&wall)).unwrap());
    }

    #[test]
    fn missing_resources_become_null() {
        let context = test_context();
        let node = ObjectRef::new(TestNode::named("node", 1));
        node.with_mut(|n: &mut TestNode| {
            n.next = crate::object::Link::Unresolved(DependencyIndex::external(0));
        });

        let remap = [FilePath::new("gone.png")];
        let find = |_: &FilePath| -> Option<ObjectRef> { None };
        let linker = ExternalDependenciesLinker::new(context.registry(), &remap, &find);
        assert_eq!(linker.link(&[node.clone()]), 0);
        assert!(node.with(|n: &TestNode| n.next.is_null()).unwrap());
    }

    #[test]
    fn delegate_may_inspect_the_objects_being_linked() {
        let context = test_context();
        let page = ObjectRef::new(TestTexture::new("page.png"));
        let atlas = ObjectRef::new(TestAtlas::new("atlas.png", &page));

        let mut bytes = Vec::new();
        {
            let mut out = OutArrayStream::new(&mut bytes);
            ReflectionSaver::new(&context, &mut out).save(&atlas).unwrap();
        }

        let mut to_load = Vec::new();
        let mut remap = Vec::new();
        let mut loader = ReflectionLoader::new(&context);
        let externals = ExternalDependencies::new(&mut to_load, &mut remap);
        loader.deserialize(&mut InRawArrayStream::new(&bytes), Some(externals)).unwrap();
        let loaded = loader.next_object().unwrap();
        assert_eq!(to_load, [FilePath::new("page.png")]);

        // The loaded atlas is itself one of the resources searched by path.
        let resources = [loaded.clone(), page.clone()];
        let find = |path: &FilePath| {
            resources
                .iter()
                .find(|r| r.resource_path().as_ref() == Some(path))
                .cloned()
        };
        let linker = ExternalDependenciesLinker::new(context.registry(), &remap, &find);
        assert_eq!(linker.link(&[loaded.clone()]), 1);
        assert!(loaded.with(|a: &TestAtlas| a.page.points_to(&page)).unwrap());
    }
}
