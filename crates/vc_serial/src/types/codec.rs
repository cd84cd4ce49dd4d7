//! Field codecs, one per field shape.
//!
//! A codec captures a pair of accessors into its host type and implements
//! the four serialization passes for the field they reach.

use alloc::vec::Vec;
use core::any::Any;

use crate::dependency::{DependencyCollector, DependencyLinker, DependencyMapper};
use crate::object::{Link, WeakLink};
use crate::serialized::SerializedReflectionObject;
use crate::stream::StreamValue;
use crate::types::{ComponentTraits, FieldShape, ReflectedEnum};
use crate::{ReflectId, Result};

// -----------------------------------------------------------------------------
// FieldCodec

/// Serialization strategy of one field.
///
/// `host` is the value declaring the field, hosts of another type are
/// ignored.
pub trait FieldCodec: Send + Sync + 'static {
    fn shape(&self) -> FieldShape;

    fn default_traits(&self) -> ComponentTraits {
        ComponentTraits::empty()
    }

    /// Writes the field, pointers are written as compressed dependency indices.
    fn save(
        &self,
        host: &dyn Any,
        id: ReflectId,
        mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()>;

    /// Reads the field. Pointers keep their saved index until restored.
    ///
    /// Missing fields keep the value the instantiator gave them.
    fn load(&self, host: &mut dyn Any, id: ReflectId, saved: &SerializedReflectionObject)
    -> Result<()>;

    /// Declares every object the field points to.
    fn map_dependencies(&self, _host: &dyn Any, _collector: &mut dyn DependencyCollector) {}

    /// Replaces saved indices with live objects.
    fn restore_dependencies(&self, _host: &mut dyn Any, _linker: &dyn DependencyLinker) {}
}

fn host_ref<H: 'static>(host: &dyn Any) -> Option<&H> {
    let host = host.downcast_ref::<H>();
    if host.is_none() {
        log::error!("field codec invoked on a host that is not `{}`", core::any::type_name::<H>());
    }
    host
}

fn host_mut<H: 'static>(host: &mut dyn Any) -> Option<&mut H> {
    let host = host.downcast_mut::<H>();
    if host.is_none() {
        log::error!("field codec invoked on a host that is not `{}`", core::any::type_name::<H>());
    }
    host
}

// -----------------------------------------------------------------------------
// ValueField

/// A field stored by value through [`StreamValue`].
pub struct ValueField<H, F> {
    get: fn(&H) -> &F,
    get_mut: fn(&mut H) -> &mut F,
}

impl<H, F> ValueField<H, F> {
    pub const fn new(get: fn(&H) -> &F, get_mut: fn(&mut H) -> &mut F) -> Self {
        Self { get, get_mut }
    }
}

impl<H: 'static, F: StreamValue> FieldCodec for ValueField<H, F> {
    fn shape(&self) -> FieldShape {
        FieldShape::Value
    }

    fn save(
        &self,
        host: &dyn Any,
        id: ReflectId,
        _mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_ref::<H>(host) else {
            return Ok(());
        };
        out.add_value(id).set((self.get)(host))
    }

    fn load(
        &self,
        host: &mut dyn Any,
        id: ReflectId,
        saved: &SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_mut::<H>(host) else {
            return Ok(());
        };
        match saved.value(id) {
            Some(value) if !value.is_empty() => {
                *(self.get_mut)(host) = value.initialize::<F>()?;
            }
            _ => log::trace!("field {id} has no saved value, keeping its default"),
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// EnumField

/// An enum field stored as the `i32` value of its enumerator.
///
/// The archived shape is [`FieldShape::Value`], so patches rename and add
/// enum fields like any other value. A stored value naming no enumerator
/// keeps the default.
pub struct EnumField<H, E> {
    get: fn(&H) -> &E,
    get_mut: fn(&mut H) -> &mut E,
}

impl<H, E> EnumField<H, E> {
    pub const fn new(get: fn(&H) -> &E, get_mut: fn(&mut H) -> &mut E) -> Self {
        Self { get, get_mut }
    }
}

impl<H: 'static, E: ReflectedEnum> FieldCodec for EnumField<H, E> {
    fn shape(&self) -> FieldShape {
        FieldShape::Value
    }

    fn save(
        &self,
        host: &dyn Any,
        id: ReflectId,
        _mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_ref::<H>(host) else {
            return Ok(());
        };
        out.add_value(id).set(&(self.get)(host).value())
    }

    fn load(
        &self,
        host: &mut dyn Any,
        id: ReflectId,
        saved: &SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_mut::<H>(host) else {
            return Ok(());
        };
        let Some(value) = saved.value(id).filter(|v| !v.is_empty()) else {
            log::trace!("enum field {id} has no saved value, keeping its default");
            return Ok(());
        };
        let raw = value.initialize::<i32>()?;
        match E::from_value(raw) {
            Some(enumerator) => *(self.get_mut)(host) = enumerator,
            None => log::warn!("value {raw} is not an enumerator of `{}`", E::TYPE_NAME),
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ValueArrayField

/// A `Vec` of values, each element stored through [`StreamValue`].
pub struct ValueArrayField<H, F> {
    get: fn(&H) -> &Vec<F>,
    get_mut: fn(&mut H) -> &mut Vec<F>,
}

impl<H, F> ValueArrayField<H, F> {
    pub const fn new(get: fn(&H) -> &Vec<F>, get_mut: fn(&mut H) -> &mut Vec<F>) -> Self {
        Self { get, get_mut }
    }
}

impl<H: 'static, F: StreamValue> FieldCodec for ValueArrayField<H, F> {
    fn shape(&self) -> FieldShape {
        FieldShape::ArrayOfValues
    }

    fn save(
        &self,
        host: &dyn Any,
        id: ReflectId,
        _mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_ref::<H>(host) else {
            return Ok(());
        };
        let array = out.add_array_of_values(id);
        array.clear();
        for item in (self.get)(host) {
            array.push(item)?;
        }
        Ok(())
    }

    fn load(
        &self,
        host: &mut dyn Any,
        id: ReflectId,
        saved: &SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_mut::<H>(host) else {
            return Ok(());
        };
        if let Some(array) = saved.array_of_values(id) {
            *(self.get_mut)(host) = array.to_vec::<F>()?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// PointerField

/// An owning pointer to another object.
pub struct PointerField<H> {
    get: fn(&H) -> &Link,
    get_mut: fn(&mut H) -> &mut Link,
}

impl<H> PointerField<H> {
    pub const fn new(get: fn(&H) -> &Link, get_mut: fn(&mut H) -> &mut Link) -> Self {
        Self { get, get_mut }
    }
}

impl<H: 'static> FieldCodec for PointerField<H> {
    fn shape(&self) -> FieldShape {
        FieldShape::Pointer
    }

    fn save(
        &self,
        host: &dyn Any,
        id: ReflectId,
        mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_ref::<H>(host) else {
            return Ok(());
        };
        let index = mapper.find_dependency((self.get)(host).get());
        out.add_pointer(id).set(index);
        Ok(())
    }

    fn load(
        &self,
        host: &mut dyn Any,
        id: ReflectId,
        saved: &SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_mut::<H>(host) else {
            return Ok(());
        };
        if let Some(pointer) = saved.pointer(id) {
            *(self.get_mut)(host) = Link::from_index(pointer.index());
        }
        Ok(())
    }

    fn map_dependencies(&self, host: &dyn Any, collector: &mut dyn DependencyCollector) {
        if let Some(target) = host_ref::<H>(host).and_then(|h| (self.get)(h).get()) {
            collector.add_dependency(target);
        }
    }

    fn restore_dependencies(&self, host: &mut dyn Any, linker: &dyn DependencyLinker) {
        let Some(host) = host_mut::<H>(host) else {
            return;
        };
        let link = (self.get_mut)(host);
        if let Some(index) = link.unresolved_index() {
            link.restore(linker.find_dependency(index));
        }
    }
}

// -----------------------------------------------------------------------------
// WeakPointerField

/// A non-owning pointer to another object.
pub struct WeakPointerField<H> {
    get: fn(&H) -> &WeakLink,
    get_mut: fn(&mut H) -> &mut WeakLink,
}

impl<H> WeakPointerField<H> {
    pub const fn new(get: fn(&H) -> &WeakLink, get_mut: fn(&mut H) -> &mut WeakLink) -> Self {
        Self { get, get_mut }
    }
}

impl<H: 'static> FieldCodec for WeakPointerField<H> {
    fn shape(&self) -> FieldShape {
        FieldShape::Pointer
    }

    fn default_traits(&self) -> ComponentTraits {
        ComponentTraits::REFERENCE
    }

    fn save(
        &self,
        host: &dyn Any,
        id: ReflectId,
        mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_ref::<H>(host) else {
            return Ok(());
        };
        let target = (self.get)(host).upgrade();
        out.add_pointer(id).set(mapper.find_dependency(target.as_ref()));
        Ok(())
    }

    fn load(
        &self,
        host: &mut dyn Any,
        id: ReflectId,
        saved: &SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_mut::<H>(host) else {
            return Ok(());
        };
        if let Some(pointer) = saved.pointer(id) {
            *(self.get_mut)(host) = WeakLink::from_index(pointer.index());
        }
        Ok(())
    }

    fn map_dependencies(&self, host: &dyn Any, collector: &mut dyn DependencyCollector) {
        if let Some(target) = host_ref::<H>(host).and_then(|h| (self.get)(h).upgrade()) {
            collector.add_dependency(&target);
        }
    }

    fn restore_dependencies(&self, host: &mut dyn Any, linker: &dyn DependencyLinker) {
        let Some(host) = host_mut::<H>(host) else {
            return;
        };
        let link = (self.get_mut)(host);
        if let Some(index) = link.unresolved_index() {
            link.restore(linker.find_dependency(index));
        }
    }
}

// -----------------------------------------------------------------------------
// PointerArrayField

/// A `Vec` of owning pointers.
pub struct PointerArrayField<H> {
    get: fn(&H) -> &Vec<Link>,
    get_mut: fn(&mut H) -> &mut Vec<Link>,
}

impl<H> PointerArrayField<H> {
    pub const fn new(get: fn(&H) -> &Vec<Link>, get_mut: fn(&mut H) -> &mut Vec<Link>) -> Self {
        Self { get, get_mut }
    }
}

impl<H: 'static> FieldCodec for PointerArrayField<H> {
    fn shape(&self) -> FieldShape {
        FieldShape::ArrayOfPointers
    }

    fn save(
        &self,
        host: &dyn Any,
        id: ReflectId,
        mapper: &dyn DependencyMapper,
        out: &mut SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_ref::<H>(host) else {
            return Ok(());
        };
        let array = out.add_array_of_pointers(id);
        array.clear();
        for link in (self.get)(host) {
            array.push(mapper.find_dependency(link.get()));
        }
        Ok(())
    }

    fn load(
        &self,
        host: &mut dyn Any,
        id: ReflectId,
        saved: &SerializedReflectionObject,
    ) -> Result<()> {
        let Some(host) = host_mut::<H>(host) else {
            return Ok(());
        };
        if let Some(array) = saved.array_of_pointers(id) {
            *(self.get_mut)(host) = array.indices().iter().copied().map(Link::from_index).collect();
        }
        Ok(())
    }

    fn map_dependencies(&self, host: &dyn Any, collector: &mut dyn DependencyCollector) {
        let Some(host) = host_ref::<H>(host) else {
            return;
        };
        for target in (self.get)(host).iter().filter_map(Link::get) {
            collector.add_dependency(target);
        }
    }

    fn restore_dependencies(&self, host: &mut dyn Any, linker: &dyn DependencyLinker) {
        let Some(host) = host_mut::<H>(host) else {
            return;
        };
        for link in (self.get_mut)(host).iter_mut() {
            if let Some(index) = link.unresolved_index() {
                link.restore(linker.find_dependency(index));
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::SerialContext;
    use crate::dependency::{ReflectionLoader, ReflectionSaver};
    use crate::object::{ObjectHeader, ObjectRef, ReflectionObject};
    use crate::stream::{InRawArrayStream, OutArrayStream};
    use crate::test_types::{WeekDays, WeekEnd};
    use crate::types::{FieldShape, Reflected, TypeBuilder};

    #[derive(Default)]
    struct OldSchedule {
        header: ObjectHeader,
        day: WeekDays,
    }

    impl Reflected for OldSchedule {
        const TYPE_NAME: &'static str = "OldSchedule";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.instantiable();
            ty.enumeration("day", |s| &s.day, |s| &mut s.day);
        }
    }

    impl ReflectionObject for OldSchedule {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut ObjectHeader {
            &mut self.header
        }
    }

    #[derive(Default)]
    struct Schedule {
        header: ObjectHeader,
        workday: WeekDays,
        rest: WeekEnd,
    }

    impl Reflected for Schedule {
        const TYPE_NAME: &'static str = "Schedule";
        const VERSION: i32 = 1;

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.instantiable();
            ty.enumeration("workday", |s| &s.workday, |s| &mut s.workday);
            ty.enumeration("rest", |s| &s.rest, |s| &mut s.rest);
        }
    }

    impl ReflectionObject for Schedule {
        fn header(&self) -> &ObjectHeader {
            &self.header
        }

        fn header_mut(&mut self) -> &mut ObjectHeader {
            &mut self.header
        }
    }

    fn archive(context: &SerialContext, object: &ObjectRef) -> Vec<u8> {
        let mut bytes = Vec::new();
        let mut out = OutArrayStream::new(&mut bytes);
        let mut saver = ReflectionSaver::new(context, &mut out);
        saver.save(object).unwrap();
        saver.flush().unwrap();
        drop(saver);
        bytes
    }

    fn load(context: &SerialContext, bytes: &[u8]) -> ObjectRef {
        let mut loader = ReflectionLoader::new(context);
        loader.deserialize(&mut InRawArrayStream::new(bytes), None).unwrap();
        loader.next_object().unwrap()
    }

    #[test]
    fn enum_fields_round_trip() {
        let context = SerialContext::builder()
            .with_enum_type::<WeekDays>()
            .with_enum_type::<WeekEnd>()
            .with_type::<Schedule>()
            .build()
            .unwrap();
        let schedule = ObjectRef::new(Schedule {
            workday: WeekDays::Wednesday,
            rest: WeekEnd::Saturday,
            ..Default::default()
        });

        let loaded = load(&context, &archive(&context, &schedule));
        loaded
            .with(|s: &Schedule| {
                assert_eq!(s.workday, WeekDays::Wednesday);
                assert_eq!(s.rest, WeekEnd::Saturday);
            })
            .unwrap();
    }

    #[test]
    fn enum_fields_survive_migration() {
        let old_context = SerialContext::builder()
            .with_enum_type::<WeekDays>()
            .with_type::<OldSchedule>()
            .build()
            .unwrap();
        let new_context = SerialContext::builder()
            .with_enum_type::<WeekDays>()
            .with_enum_type::<WeekEnd>()
            .with_type::<Schedule>()
            .with_patches(|patches| {
                patches
                    .add_patch("", -1, "OldSchedule", 0)
                    .add_field("day", FieldShape::Value);
                patches
                    .add_patch("OldSchedule", 0, "Schedule", 1)
                    .change_field("day", "workday")
                    .add_field("rest", FieldShape::Value);
            })
            .build()
            .unwrap();

        let old = ObjectRef::new(OldSchedule {
            day: WeekDays::Thursday,
            ..Default::default()
        });
        let loaded = load(&new_context, &archive(&old_context, &old));
        loaded
            .with(|s: &Schedule| {
                assert_eq!(s.workday, WeekDays::Thursday);
                assert_eq!(s.rest, WeekEnd::Sunday);
            })
            .unwrap();
    }

    #[test]
    fn unknown_enumerators_keep_the_default() {
        let old_context = SerialContext::builder()
            .with_type::<OldSchedule>()
            .build()
            .unwrap();
        // `OldSchedule` read back as a schedule whose `day` holds a weekend value.
        #[derive(Default)]
        struct WeekendSchedule {
            header: ObjectHeader,
            day: WeekEnd,
        }

        impl Reflected for WeekendSchedule {
            const TYPE_NAME: &'static str = "OldSchedule";

            fn describe(ty: &mut TypeBuilder<Self>) {
                ty.instantiable();
                ty.enumeration("day", |s| &s.day, |s| &mut s.day);
            }
        }

        impl ReflectionObject for WeekendSchedule {
            fn header(&self) -> &ObjectHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut ObjectHeader {
                &mut self.header
            }
        }

        let new_context = SerialContext::builder()
            .with_type::<WeekendSchedule>()
            .build()
            .unwrap();

        let old = ObjectRef::new(OldSchedule {
            day: WeekDays::Friday,
            ..Default::default()
        });
        let loaded = load(&new_context, &archive(&old_context, &old));
        assert_eq!(loaded.with(|s: &WeekendSchedule| s.day), Some(WeekEnd::Sunday));
    }
}
