//! One-call helpers saving and loading objects through a [`Filesystem`].
//!
//! These helpers handle self-contained archives only. Objects pointing to
//! [`Resource`](crate::object::Resource)s need a resource manager that
//! loads the referenced files and links them with an
//! [`ExternalDependenciesLinker`](crate::dependency::ExternalDependenciesLinker).

use alloc::vec::Vec;
use core::slice;

use crate::dependency::{
    ExternalDependencies, ReflectionLoader, ReflectionSaver, ResourceDependenciesMapper,
};
use crate::fs::{FilePath, Filesystem};
use crate::object::ObjectRef;
use crate::progress::ProgressObserver;
use crate::stream::{InFileStream, OutFileStream};
use crate::{Result, SerialContext};

/// Saves one object and its dependencies to `path`.
pub fn save_object(
    context: &SerialContext,
    filesystem: &dyn Filesystem,
    object: &ObjectRef,
    path: &FilePath,
    progress: Option<&mut dyn ProgressObserver>,
) -> Result<()> {
    save_objects(context, filesystem, slice::from_ref(object), path, progress)
}

/// Saves `objects` as the roots of one archive at `path`.
///
/// When the observer is cancelled, the objects saved so far are written.
pub fn save_objects(
    context: &SerialContext,
    filesystem: &dyn Filesystem,
    objects: &[ObjectRef],
    path: &FilePath,
    mut progress: Option<&mut dyn ProgressObserver>,
) -> Result<()> {
    let mut stream = OutFileStream::new(filesystem.open_write(path)?);
    let mut saver = ReflectionSaver::new(context, &mut stream);

    if let Some(progress) = progress.as_deref_mut() {
        progress.initialize(objects.len());
        progress.set_status("Saving objects");
    }

    for object in objects {
        if progress.as_deref().is_some_and(|p| p.is_cancelled()) {
            log::info!("saving `{path}` was cancelled");
            break;
        }
        saver.save(object)?;
        if let Some(progress) = progress.as_deref_mut() {
            progress.advance();
        }
    }

    let mut externals = Vec::new();
    saver.collect_external_dependencies(&mut externals);
    debug_assert!(
        externals.is_empty(),
        "objects saved to `{path}` depend on resources and will be incomplete once loaded"
    );
    if !externals.is_empty() {
        log::error!(
            "objects saved to `{path}` depend on {} resources and will be incomplete once loaded",
            externals.len()
        );
    }

    saver.flush()
}

/// Loads the first root of the archive at `path`.
pub fn load_object(
    context: &SerialContext,
    filesystem: &dyn Filesystem,
    path: &FilePath,
    progress: Option<&mut dyn ProgressObserver>,
) -> Result<Option<ObjectRef>> {
    let objects = load_objects(context, filesystem, path, progress)?;
    Ok(objects.into_iter().next())
}

/// Loads every root of the archive at `path`, in save order.
///
/// Archives referencing resources are refused and yield no objects.
pub fn load_objects(
    context: &SerialContext,
    filesystem: &dyn Filesystem,
    path: &FilePath,
    mut progress: Option<&mut dyn ProgressObserver>,
) -> Result<Vec<ObjectRef>> {
    let mut stream = InFileStream::new(filesystem.open_read(path)?);
    let mut to_load = Vec::new();
    let mut remap = Vec::new();
    let mut loader = ReflectionLoader::new(context);
    loader.deserialize(
        &mut stream,
        Some(ExternalDependencies::new(&mut to_load, &mut remap)),
    )?;

    debug_assert!(
        to_load.is_empty(),
        "`{path}` references resources, load it through a resource manager"
    );
    if !to_load.is_empty() {
        log::error!("`{path}` references {} resources and was not loaded", to_load.len());
        return Ok(Vec::new());
    }

    let count = loader.loaded_objects().len();
    if let Some(progress) = progress.as_deref_mut() {
        progress.initialize(count);
        progress.set_status("Loading objects");
    }

    let mut objects = Vec::with_capacity(count);
    while let Some(object) = loader.next_object() {
        if progress.as_deref().is_some_and(|p| p.is_cancelled()) {
            log::info!("loading `{path}` was cancelled");
            break;
        }
        objects.push(object);
        if let Some(progress) = progress.as_deref_mut() {
            progress.advance();
        }
    }

    loader.notify_objects_loaded();
    Ok(objects)
}

/// Appends the path of every resource reachable from `object`.
pub fn collect_external_dependencies(
    context: &SerialContext,
    object: &ObjectRef,
    paths: &mut Vec<FilePath>,
) -> Result<()> {
    ResourceDependenciesMapper::new(context.registry(), paths).map_dependencies(object)
}

// -----------------------------------------------------------------------------
// Tests
