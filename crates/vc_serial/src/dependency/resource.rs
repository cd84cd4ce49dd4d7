use alloc::vec::Vec;
use core::any::Any;

use vc_utils::hash::HashSet;

use crate::Result;
use crate::fs::FilePath;
use crate::object::ObjectRef;
use crate::types::{SerializableReflectionType, TypesRegistry};

// -----------------------------------------------------------------------------
// ResourceDependenciesMapper

/// Lists the resources an object graph depends on.
///
/// Internal objects are walked through, resources are reported by path
/// and not entered.
pub struct ResourceDependenciesMapper<'a> {
    registry: &'a TypesRegistry,
    paths: &'a mut Vec<FilePath>,
}

impl<'a> ResourceDependenciesMapper<'a> {
    pub fn new(registry: &'a TypesRegistry, paths: &'a mut Vec<FilePath>) -> Self {
        Self { registry, paths }
    }

    /// Appends the path of every resource reachable from `object`.
    ///
    /// Paths already in the list are not added again.
    pub fn map_dependencies(&mut self, object: &ObjectRef) -> Result<()> {
        let mut visited: HashSet<usize> = HashSet::default();
        let mut stack = vec![object.clone()];
        visited.insert(object.addr());

        let mut found = Vec::new();
        while let Some(current) = stack.pop() {
            {
                let guard = current.read();
                self.registry.map_types_hierarchy(
                    current.type_uid(),
                    guard.as_any(),
                    &mut |ty: &SerializableReflectionType, host: &dyn Any| {
                        for component in ty.components() {
                            component.map_dependencies(host, &mut found);
                        }
                        Ok(())
                    },
                )?;
            }

            for dependency in found.drain(..) {
                if dependency.is_resource() {
                    if let Some(path) = dependency.resource_path()
                        && !self.paths.contains(&path)
                    {
                        self.paths.push(path);
                    }
                } else if visited.insert(dependency.addr()) {
                    stack.push(dependency);
                }
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
