use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::any::Any;

use vc_utils::hash::NoOpHashMap;

use crate::dependency::{ARCHIVE_MAGIC, DependencyLinker, LinkTarget};
use crate::fs::FilePath;
use crate::object::{ObjectRef, ObjectsTracker, UniqueId};
use crate::serialized::SerializedReflectionObject;
use crate::stream::{InRawArrayStream, InStream, StreamValue};
use crate::types::SerializableReflectionType;
use crate::{DependencyIndex, DependencySlot, ReflectId, Result, SerialContext, SerialError};

// -----------------------------------------------------------------------------
// ExternalDependencies

/// Where a loader reports the external dependencies of an archive.
///
/// `remap` is shared by every archive of a loading session. Each archive
/// appends all of its paths to it, and its external indices are shifted by
/// the length `remap` had before. `to_load` receives every path once.
pub struct ExternalDependencies<'r> {
    pub to_load: &'r mut Vec<FilePath>,
    pub remap: &'r mut Vec<FilePath>,
}

impl<'r> ExternalDependencies<'r> {
    #[inline]
    pub fn new(to_load: &'r mut Vec<FilePath>, remap: &'r mut Vec<FilePath>) -> Self {
        Self { to_load, remap }
    }
}

// -----------------------------------------------------------------------------
// Archive linking

struct ArchiveLinker<'d> {
    dependencies: &'d [Option<ObjectRef>],
    external_offset: usize,
}

impl DependencyLinker for ArchiveLinker<'_> {
    fn find_dependency(&self, index: DependencyIndex) -> LinkTarget {
        match index.decode() {
            DependencySlot::Null => LinkTarget::Null,
            DependencySlot::Internal(slot) => match self.dependencies.get(slot) {
                Some(Some(object)) => LinkTarget::Object(object.clone()),
                _ => LinkTarget::Null,
            },
            DependencySlot::External(_) => {
                LinkTarget::Pending(index.with_external_offset(self.external_offset))
            }
        }
    }
}

enum ArchiveEntry {
    Reused(ObjectRef),
    Stored(UniqueId, Vec<u8>),
}

// -----------------------------------------------------------------------------
// ReflectionLoader

/// Reads archives written by a [`ReflectionSaver`](crate::dependency::ReflectionSaver).
///
/// Roots are queued in the order they were saved and handed out by
/// [`next_object`](Self::next_object). One loader can read several archives.
///
/// With an [`ObjectsTracker`], objects whose [`UniqueId`] is already
/// tracked are reused instead of being loaded again.
pub struct ReflectionLoader<'a> {
    context: &'a SerialContext,
    tracker: Option<&'a mut dyn ObjectsTracker>,
    loaded: VecDeque<ObjectRef>,
    all_loaded: Vec<ObjectRef>,
    to_notify: Vec<ObjectRef>,
}

impl<'a> ReflectionLoader<'a> {
    pub fn new(context: &'a SerialContext) -> Self {
        Self {
            context,
            tracker: None,
            loaded: VecDeque::new(),
            all_loaded: Vec::new(),
            to_notify: Vec::new(),
        }
    }

    pub fn with_tracker(context: &'a SerialContext, tracker: &'a mut dyn ObjectsTracker) -> Self {
        Self {
            tracker: Some(tracker),
            ..Self::new(context)
        }
    }

    /// Reads one archive.
    ///
    /// Without `externals` the external dependency table is skipped and
    /// links to resources keep their unshifted index. Nothing is queued, tracked or reported
    /// unless the whole archive is read successfully.
    pub fn deserialize(
        &mut self,
        input: &mut dyn InStream,
        externals: Option<ExternalDependencies<'_>>,
    ) -> Result<()> {
        let magic = input.read_u32()?;
        if magic != ARCHIVE_MAGIC {
            return Err(SerialError::BadMagic { found: magic });
        }

        let external_paths = if externals.is_some() {
            read_external_table(input)?
        } else {
            let size = input.read_len()?;
            input.skip(size)?;
            Vec::new()
        };
        let external_offset = externals.as_ref().map_or(0, |e| e.remap.len());

        let count = input.read_len()?;
        let mut entries = Vec::new();
        for _ in 0..count {
            let unique_id = UniqueId::load(input)?;
            let size = input.read_len()?;
            match self.find_tracked(&unique_id) {
                Some(object) => {
                    log::trace!("reusing tracked object `{unique_id}`");
                    input.skip(size)?;
                    entries.push(ArchiveEntry::Reused(object));
                }
                None => entries.push(ArchiveEntry::Stored(unique_id, input.read_vec(size)?)),
            }
        }

        let root_count = input.read_len()?;
        let mut roots = Vec::new();
        for _ in 0..root_count {
            roots.push(input.read_len()?);
        }

        let mut dependencies = Vec::with_capacity(entries.len());
        let mut fresh = Vec::new();
        for entry in entries {
            match entry {
                ArchiveEntry::Reused(object) => dependencies.push(Some(object)),
                ArchiveEntry::Stored(unique_id, payload) => {
                    let object = self.load_object(unique_id, &payload)?;
                    if let Some(object) = &object {
                        fresh.push(object.clone());
                    }
                    dependencies.push(object);
                }
            }
        }

        let linker = ArchiveLinker {
            dependencies: &dependencies,
            external_offset,
        };
        for object in &fresh {
            self.restore_dependencies(object, &linker)?;
        }

        if roots.is_empty() && !dependencies.is_empty() {
            log::error!("archive holds {} objects but no roots, discarding them", dependencies.len());
            return Ok(());
        }

        if let Some(ExternalDependencies { to_load, remap }) = externals {
            for path in external_paths {
                if !to_load.contains(&path) {
                    to_load.push(path.clone());
                }
                remap.push(path);
            }
        }
        if let Some(tracker) = self.tracker.as_deref_mut() {
            for object in fresh.iter().filter(|o| !o.unique_id().is_empty()) {
                tracker.track_instance(object);
            }
        }

        for index in roots {
            match dependencies.get(index) {
                Some(Some(object)) => self.loaded.push_back(object.clone()),
                Some(None) => {}
                None => log::warn!("root index {index} is out of range, skipping it"),
            }
        }
        self.all_loaded.extend(dependencies.into_iter().flatten());
        self.to_notify.extend(fresh);
        Ok(())
    }

    /// The next root, in save order.
    pub fn next_object(&mut self) -> Option<ObjectRef> {
        self.loaded.pop_front()
    }

    /// Roots not handed out yet.
    pub fn loaded_objects(&self) -> &VecDeque<ObjectRef> {
        &self.loaded
    }

    /// Every object read by this loader, reused ones included.
    pub fn all_loaded_objects(&self) -> &[ObjectRef] {
        &self.all_loaded
    }

    /// Calls [`on_object_loaded`](crate::object::ReflectionObject::on_object_loaded)
    /// on every object loaded since the last call.
    ///
    /// Call it once every link, external ones included, is bound.
    pub fn notify_objects_loaded(&mut self) {
        for object in self.to_notify.drain(..) {
            object.write().on_object_loaded();
        }
    }

    fn find_tracked(&self, unique_id: &UniqueId) -> Option<ObjectRef> {
        if unique_id.is_empty() {
            return None;
        }
        self.tracker.as_deref()?.find_instance(unique_id)
    }

    fn load_object(&self, unique_id: UniqueId, payload: &[u8]) -> Result<Option<ObjectRef>> {
        let mut stream = InRawArrayStream::new(payload);
        let type_id = ReflectId::from_raw(stream.read_u32()?);
        let version = stream.read_i32()?;

        let section_count = stream.read_len()?;
        let mut sections = NoOpHashMap::default();
        for _ in 0..section_count {
            let section_id = ReflectId::from_raw(stream.read_u32()?);
            let section_version = stream.read_i32()?;
            let mut saved = SerializedReflectionObject::load(&mut stream)?;
            match self.upgrade_section(section_id, section_version, &mut saved) {
                Some(latest) => {
                    sections.insert(latest, saved);
                }
                None => log::debug!("dropping data of unknown type {section_id}@{section_version}"),
            }
        }

        let Some(ty) = self.resolve_type(type_id, version) else {
            log::warn!("object `{unique_id}` has unknown type {type_id}@{version}, skipping it");
            return Ok(None);
        };
        let Some(mut object) = ty.instantiate() else {
            log::warn!("object `{unique_id}` has abstract type `{}`, skipping it", ty.name());
            return Ok(None);
        };

        self.context.registry().map_types_hierarchy_mut(
            ty.id(),
            object.as_any_mut(),
            &mut |part: &SerializableReflectionType, host: &mut dyn Any| {
                let Some(saved) = sections.get(&part.id()) else {
                    log::trace!("no saved data for `{}`, keeping defaults", part.name());
                    return Ok(());
                };
                for component in part.components() {
                    component.load(&mut *host, saved)?;
                }
                Ok(())
            },
        )?;

        object.header_mut().set_unique_id(unique_id);
        Ok(Some(ObjectRef::from_boxed(object)))
    }

    fn resolve_type(&self, type_id: ReflectId, version: i32) -> Option<&SerializableReflectionType> {
        let registry = self.context.registry();
        if let Some(ty) = registry.find_serializable(type_id)
            && ty.version() == version
        {
            return Some(ty);
        }
        if let Some(latest) = self.context.patches().find_latest_type(type_id, version)
            && let Some(ty) = registry.find_serializable(latest)
        {
            return Some(ty);
        }
        let ty = registry.find_serializable(type_id)?;
        log::warn!(
            "no patch leads from `{}`@{version} to version {}, loading it as is",
            ty.name(),
            ty.version()
        );
        Some(ty)
    }

    fn upgrade_section(
        &self,
        type_id: ReflectId,
        version: i32,
        saved: &mut SerializedReflectionObject,
    ) -> Option<ReflectId> {
        let registry = self.context.registry();
        if registry
            .find_serializable(type_id)
            .is_some_and(|ty| ty.version() == version)
        {
            return Some(type_id);
        }
        if let Some(latest) = self.context.patches().migrate_data(type_id, version, saved)
            && registry.find_serializable(latest).is_some()
        {
            return Some(latest);
        }
        registry.find_serializable(type_id).map(|ty| ty.id())
    }

    fn restore_dependencies(&self, object: &ObjectRef, linker: &dyn DependencyLinker) -> Result<()> {
        let mut guard = object.write();
        self.context.registry().map_types_hierarchy_mut(
            object.type_uid(),
            guard.as_any_mut(),
            &mut |part: &SerializableReflectionType, host: &mut dyn Any| {
                for component in part.components() {
                    component.restore_dependencies(&mut *host, linker);
                }
                Ok(())
            },
        )
    }
}

fn read_external_table(input: &mut dyn InStream) -> Result<Vec<FilePath>> {
    let table = input.read_bytes()?;
    let mut table = InRawArrayStream::new(&table);
    let count = table.read_len()?;
    let mut paths = Vec::new();
    for _ in 0..count {
        paths.push(FilePath::load(&mut table)?);
    }
    Ok(paths)
}

// -----------------------------------------------------------------------------
// Tests
