use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::any::Any;

use vc_utils::hash::HashMap;

use crate::dependency::{ARCHIVE_MAGIC, DependencyMapper};
use crate::fs::FilePath;
use crate::object::{ObjectRef, UniqueId};
use crate::serialized::SerializedReflectionObject;
use crate::stream::{OutArrayStream, OutStream, StreamValue};
use crate::types::SerializableReflectionType;
use crate::{DependencyIndex, Result, SerialContext, SerialError};

// -----------------------------------------------------------------------------
// ReflectionSaver

/// Writes object graphs into one archive.
///
/// Every [`save`](Self::save) adds a root. Objects reachable from several
/// roots are stored once. The archive is written by [`flush`](Self::flush),
/// or when the saver is dropped.
///
/// # Examples
///
/// ```ignore
/// let mut bytes = Vec::new();
/// let mut out = OutArrayStream::new(&mut bytes);
/// let mut saver = ReflectionSaver::new(&context, &mut out);
/// saver.save(&scene)?;
/// saver.flush()?;
/// ```
pub struct ReflectionSaver<'a> {
    context: &'a SerialContext,
    out: &'a mut dyn OutStream,
    internal: Vec<ObjectRef>,
    internal_lookup: HashMap<usize, usize>,
    external: Vec<FilePath>,
    external_objects: Vec<ObjectRef>,
    external_lookup: HashMap<FilePath, usize>,
    queue: VecDeque<usize>,
    roots: Vec<usize>,
}

impl<'a> ReflectionSaver<'a> {
    pub fn new(context: &'a SerialContext, out: &'a mut dyn OutStream) -> Self {
        Self {
            context,
            out,
            internal: Vec::new(),
            internal_lookup: HashMap::default(),
            external: Vec::new(),
            external_objects: Vec::new(),
            external_lookup: HashMap::default(),
            queue: VecDeque::new(),
            roots: Vec::new(),
        }
    }

    /// Adds `object` and everything it depends on to the archive.
    ///
    /// Saving an object twice stores it once and lists it twice as a root.
    ///
    /// On error nothing this call added is kept, earlier saves stay valid.
    pub fn save(&mut self, object: &ObjectRef) -> Result<()> {
        if let Some(&index) = self.internal_lookup.get(&object.addr()) {
            self.roots.push(index);
            return Ok(());
        }
        let mark = (self.internal.len(), self.external.len(), self.roots.len());
        let index = self.add_internal(object);
        self.roots.push(index);
        let result = self.map_pending();
        if result.is_err() {
            self.rollback(mark);
        }
        result
    }

    /// Resources the saved objects point to, in discovery order.
    pub fn collect_external_dependencies(&self, out: &mut Vec<ObjectRef>) {
        out.extend(self.external_objects.iter().cloned());
    }

    /// Number of distinct objects stored inline so far.
    pub fn internal_count(&self) -> usize {
        self.internal.len()
    }

    /// Writes the archive and resets the saver.
    pub fn flush(&mut self) -> Result<()> {
        let mut entries = Vec::with_capacity(self.internal.len());
        for object in &self.internal {
            entries.push(self.encode_object(object)?);
        }

        let mut table = Vec::new();
        let mut table_stream = OutArrayStream::new(&mut table);
        table_stream.write_len(self.external.len())?;
        for path in &self.external {
            path.save(&mut table_stream)?;
        }

        let out = &mut *self.out;
        out.write_u32(ARCHIVE_MAGIC)?;
        out.write_bytes(&table)?;

        out.write_len(entries.len())?;
        for (unique_id, payload) in &entries {
            unique_id.save(out)?;
            out.write_bytes(payload)?;
        }

        out.write_len(self.roots.len())?;
        for &root in &self.roots {
            out.write_len(root)?;
        }
        out.flush()?;

        log::debug!(
            "archived {} objects, {} external dependencies, {} roots",
            entries.len(),
            self.external.len(),
            self.roots.len()
        );
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.internal.clear();
        self.internal_lookup.clear();
        self.external.clear();
        self.external_objects.clear();
        self.external_lookup.clear();
        self.queue.clear();
        self.roots.clear();
    }

    fn rollback(&mut self, (internal, external, roots): (usize, usize, usize)) {
        for object in self.internal.drain(internal..) {
            self.internal_lookup.remove(&object.addr());
        }
        for path in self.external.drain(external..) {
            self.external_lookup.remove(&path);
        }
        self.external_objects.truncate(external);
        self.roots.truncate(roots);
        self.queue.clear();
    }

    fn has_pending(&self) -> bool {
        !self.internal.is_empty() || !self.roots.is_empty()
    }

    fn add_internal(&mut self, object: &ObjectRef) -> usize {
        object.write().on_object_pre_save();
        let index = self.internal.len();
        self.internal.push(object.clone());
        self.internal_lookup.insert(object.addr(), index);
        self.queue.push_back(index);
        index
    }

    fn add_external(&mut self, object: &ObjectRef) {
        let Some(path) = object.resource_path() else {
            return;
        };
        if self.external_lookup.contains_key(&path) {
            return;
        }
        self.external_lookup.insert(path.clone(), self.external.len());
        self.external.push(path);
        self.external_objects.push(object.clone());
    }

    fn map_pending(&mut self) -> Result<()> {
        let context = self.context;
        let registry = context.registry();
        let mut dependencies = Vec::new();

        while let Some(index) = self.queue.pop_front() {
            let object = self.internal[index].clone();
            {
                let guard = object.read();
                registry.map_types_hierarchy(
                    object.type_uid(),
                    guard.as_any(),
                    &mut |ty: &SerializableReflectionType, host: &dyn Any| {
                        for component in ty.components() {
                            component.map_dependencies(host, &mut dependencies);
                        }
                        Ok(())
                    },
                )?;
            }

            for dependency in dependencies.drain(..) {
                if dependency.is_resource() {
                    self.add_external(&dependency);
                } else if !self.internal_lookup.contains_key(&dependency.addr()) {
                    self.add_internal(&dependency);
                }
            }
        }
        Ok(())
    }

    fn encode_object(&self, object: &ObjectRef) -> Result<(UniqueId, Vec<u8>)> {
        let registry = self.context.registry();
        let guard = object.read();
        let ty = registry
            .find_serializable(object.type_uid())
            .ok_or(SerialError::UnknownType(object.type_uid()))?;

        let mut sections = Vec::new();
        registry.map_types_hierarchy(
            ty.id(),
            guard.as_any(),
            &mut |ty: &SerializableReflectionType, host: &dyn Any| {
                let mut saved = SerializedReflectionObject::new();
                for component in ty.components() {
                    component.save(host, self, &mut saved)?;
                }
                sections.push((ty.id(), ty.version(), saved));
                Ok(())
            },
        )?;

        let mut payload = Vec::new();
        let mut stream = OutArrayStream::new(&mut payload);
        stream.write_u32(ty.id().to_raw())?;
        stream.write_i32(ty.version())?;
        stream.write_len(sections.len())?;
        for (id, version, saved) in &sections {
            stream.write_u32(id.to_raw())?;
            stream.write_i32(*version)?;
            saved.save(&mut stream)?;
        }

        Ok((guard.header().unique_id().clone(), payload))
    }
}

impl DependencyMapper for ReflectionSaver<'_> {
    fn find_dependency(&self, object: Option<&ObjectRef>) -> DependencyIndex {
        let Some(object) = object else {
            return DependencyIndex::NULL;
        };
        if object.is_resource() {
            let index = object
                .resource_path()
                .and_then(|path| self.external_lookup.get(&path).copied());
            return match index {
                Some(index) => DependencyIndex::external(index),
                None => {
                    log::warn!("resource {object:?} was not mapped, saving a null pointer");
                    DependencyIndex::NULL
                }
            };
        }
        match self.internal_lookup.get(&object.addr()) {
            Some(&index) => DependencyIndex::internal(index),
            None => {
                #[cfg(all(debug_assertions, feature = "debug"))]
                log::warn!("object {object:?} was not mapped, saving a null pointer");
                DependencyIndex::NULL
            }
        }
    }
}

impl Drop for ReflectionSaver<'_> {
    fn drop(&mut self) {
        if self.has_pending()
            && let Err(err) = self.flush()
        {
            log::error!("failed to write the archive: {err}");
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::ReflectionLoader;
    use crate::stream::InRawArrayStream;
    use crate::test_types::{TestMaterial, TestNode, TestTexture, test_context};

    #[test]
    fn shared_dependency_is_stored_once() {
        let context = test_context();
        let shared = ObjectRef::new(TestNode::named("shared", 7));
        let a = ObjectRef::new(TestNode::named("a", 1).with_next(&shared));
        let b = ObjectRef::new(TestNode::named("b", 2).with_next(&shared));

        let mut bytes = Vec::new();
        {
            let mut out = OutArrayStream::new(&mut bytes);
            let mut saver = ReflectionSaver::new(&context, &mut out);
            saver.save(&a).unwrap();
            saver.save(&b).unwrap();
            assert_eq!(saver.internal_count(), 3);
        }

        let mut loader = ReflectionLoader::new(&context);
        loader.deserialize(&mut InRawArrayStream::new(&bytes), None).unwrap();
        let a = loader.next_object().unwrap();
        let b = loader.next_object().unwrap();
        let next_a = a.with(|n: &TestNode| n.next.get().cloned()).unwrap().unwrap();
        let next_b = b.with(|n: &TestNode| n.next.get().cloned()).unwrap().unwrap();
        assert!(next_a.ptr_eq(&next_b));
        assert_eq!(next_a.with(|n: &TestNode| n.value), Some(7));
    }

    #[test]
    fn saving_a_root_twice_adds_a_root_index() {
        let context = test_context();
        let node = ObjectRef::new(TestNode::named("node", 1));

        let mut bytes = Vec::new();
        let mut out = OutArrayStream::new(&mut bytes);
        let mut saver = ReflectionSaver::new(&context, &mut out);
        saver.save(&node).unwrap();
        saver.save(&node).unwrap();
        assert_eq!(saver.internal_count(), 1);
        saver.flush().unwrap();
        drop(saver);

        let mut loader = ReflectionLoader::new(&context);
        loader.deserialize(&mut InRawArrayStream::new(&bytes), None).unwrap();
        let first = loader.next_object().unwrap();
        let second = loader.next_object().unwrap();
        assert!(first.ptr_eq(&second));
        assert!(loader.next_object().is_none());
        assert_eq!(loader.all_loaded_objects().len(), 1);
    }

    #[test]
    fn resources_are_external() {
        let context = test_context();
        let texture = ObjectRef::new(TestTexture::new("textures/wall.png"));
        let node = ObjectRef::new(TestNode::named("node", 1).with_next(&texture));

        let mut bytes = Vec::new();
        let mut out = OutArrayStream::new(&mut bytes);
        let mut saver = ReflectionSaver::new(&context, &mut out);
        saver.save(&node).unwrap();

        let mut externals = Vec::new();
        saver.collect_external_dependencies(&mut externals);
        assert_eq!(externals.len(), 1);
        assert!(externals[0].ptr_eq(&texture));
        assert_eq!(saver.internal_count(), 1);
        assert_eq!(saver.find_dependency(Some(&texture)), DependencyIndex::external(0));
        assert_eq!(saver.find_dependency(Some(&node)), DependencyIndex::internal(0));
        assert_eq!(saver.find_dependency(None), DependencyIndex::NULL);
    }

    #[test]
    fn pre_save_runs_once_per_save() {
        let context = test_context();
        let node = ObjectRef::new(TestNode::named("node", 1));

        let mut bytes = Vec::new();
        let mut out = OutArrayStream::new(&mut bytes);
        let mut saver = ReflectionSaver::new(&context, &mut out);
        saver.save(&node).unwrap();
        saver.save(&node).unwrap();
        saver.flush().unwrap();
        saver.save(&node).unwrap();
        saver.flush().unwrap();

        assert_eq!(node.with(|n: &TestNode| n.pre_saves), Some(2));
    }

    #[test]
    fn cycles_terminate() {
        let context = test_context();
        let a = ObjectRef::new(TestNode::named("a", 1));
        let b = ObjectRef::new(TestNode::named("b", 2).with_next(&a));
        a.with_mut(|n: &mut TestNode| n.next.set(Some(b.clone())));

        let mut bytes = Vec::new();
        let mut out = OutArrayStream::new(&mut bytes);
        let mut saver = ReflectionSaver::new(&context, &mut out);
        saver.save(&a).unwrap();
        assert_eq!(saver.internal_count(), 2);
        saver.flush().unwrap();
        drop(saver);

        // Break the cycle so both objects can be freed.
        a.with_mut(|n: &mut TestNode| n.next.take());
        assert!(bytes.len() > 4);
    }

    #[test]
    fn failed_save_leaves_earlier_work_intact() {
        let context = SerialContext::builder()
            .with_type::<TestMaterial>()
            .build()
            .unwrap();
        let wall = ObjectRef::new(TestTexture::new("wall.png"));
        let floor = ObjectRef::new(TestTexture::new("floor.png"));
        let kept = ObjectRef::new(TestMaterial::new("kept", &wall, &wall));
        let node = ObjectRef::new(TestNode::named("node", 1));
        let broken = ObjectRef::new(TestMaterial::new("broken", &floor, &node));

        let mut bytes = Vec::new();
        {
            let mut out = OutArrayStream::new(&mut bytes);
            let mut saver = ReflectionSaver::new(&context, &mut out);
            saver.save(&kept).unwrap();
            assert!(matches!(saver.save(&node), Err(SerialError::UnknownType(_))));
            assert!(saver.save(&broken).is_err());
            assert_eq!(saver.internal_count(), 1);
            assert_eq!(saver.find_dependency(Some(&floor)), DependencyIndex::NULL);

            let mut externals = Vec::new();
            saver.collect_external_dependencies(&mut externals);
            assert_eq!(externals.len(), 1);

            saver.save(&ObjectRef::new(TestMaterial::default())).unwrap();
            assert_eq!(saver.internal_count(), 2);
            saver.flush().unwrap();
        }

        let mut loader = ReflectionLoader::new(&context);
        loader.deserialize(&mut InRawArrayStream::new(&bytes), None).unwrap();
        assert_eq!(loader.loaded_objects().len(), 2);
        assert_eq!(loader.all_loaded_objects().len(), 2);
    }
}
