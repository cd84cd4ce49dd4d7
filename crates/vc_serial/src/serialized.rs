//! The flat, per-type representation of an object's fields.
//!
//! Each object is saved as one [`SerializedReflectionObject`] per type in
//! its hierarchy. Fields are addressed by the [`ReflectId`] of their member
//! name, so patches can add, remove and rename fields without knowing the
//! live types.

use alloc::vec::Vec;

use crate::stream::{InRawArrayStream, InStream, OutArrayStream, OutStream, StreamValue};
use crate::types::FieldShape;
use crate::{DependencyIndex, ReflectId, Result, SerialError};

// -----------------------------------------------------------------------------
// SerializedValue

/// The encoded bytes of one value field.
///
/// An empty value carries no data, it is produced when a patch adds a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedValue {
    id: ReflectId,
    bytes: Vec<u8>,
}

impl SerializedValue {
    #[inline]
    pub const fn new(id: ReflectId) -> Self {
        Self {
            id,
            bytes: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.id
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Replaces the stored bytes with the encoding of `value`.
    pub fn set<T: StreamValue>(&mut self, value: &T) -> Result<()> {
        let mut bytes = Vec::new();
        value.save(&mut OutArrayStream::new(&mut bytes))?;
        self.bytes = bytes;
        Ok(())
    }

    /// Decodes the stored bytes.
    pub fn initialize<T: StreamValue>(&self) -> Result<T> {
        T::load(&mut InRawArrayStream::new(&self.bytes))
    }
}

// -----------------------------------------------------------------------------
// SerializedPointer

/// The compressed dependency index of one pointer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializedPointer {
    id: ReflectId,
    index: DependencyIndex,
}

impl SerializedPointer {
    #[inline]
    pub const fn new(id: ReflectId) -> Self {
        Self {
            id,
            index: DependencyIndex::NULL,
        }
    }

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.id
    }

    #[inline]
    pub fn index(&self) -> DependencyIndex {
        self.index
    }

    #[inline]
    pub fn set(&mut self, index: DependencyIndex) {
        self.index = index;
    }
}

// -----------------------------------------------------------------------------
// SerializedArrayOfValues

/// The encoded elements of an array field, packed in one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedArrayOfValues {
    id: ReflectId,
    buffer: Vec<u8>,
    offsets: Vec<u32>,
}

impl SerializedArrayOfValues {
    #[inline]
    pub const fn new(id: ReflectId) -> Self {
        Self {
            id,
            buffer: Vec::new(),
            offsets: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.id
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.offsets.clear();
    }

    pub fn push<T: StreamValue>(&mut self, value: &T) -> Result<()> {
        let start = self.buffer.len();
        let offset = u32::try_from(start).map_err(|_| SerialError::LengthOverflow(start))?;
        value.save(&mut OutArrayStream::new(&mut self.buffer))?;
        self.offsets.push(offset);
        Ok(())
    }

    /// The encoded bytes of one element.
    pub fn element_bytes(&self, index: usize) -> Option<&[u8]> {
        let start = *self.offsets.get(index)? as usize;
        let end = match self.offsets.get(index + 1) {
            Some(end) => *end as usize,
            None => self.buffer.len(),
        };
        self.buffer.get(start..end)
    }

    pub fn get<T: StreamValue>(&self, index: usize) -> Option<Result<T>> {
        self.element_bytes(index)
            .map(|bytes| T::load(&mut InRawArrayStream::new(bytes)))
    }

    /// Decodes every element.
    ///
    /// Fails on the first element that can not be decoded, the array is
    /// never shortened.
    pub fn to_vec<T: StreamValue>(&self) -> Result<Vec<T>> {
        let mut items = Vec::with_capacity(self.len());
        for index in 0..self.len() {
            let item = self
                .get::<T>(index)
                .ok_or(SerialError::BadArrayOffset(index))?
                .inspect_err(|err| {
                    log::warn!("element {index} of array {} can not be decoded: {err}", self.id);
                })?;
            items.push(item);
        }
        Ok(items)
    }
}

// -----------------------------------------------------------------------------
// SerializedArrayOfPointers

/// The compressed dependency indices of an array of pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedArrayOfPointers {
    id: ReflectId,
    indices: Vec<DependencyIndex>,
}

impl SerializedArrayOfPointers {
    #[inline]
    pub const fn new(id: ReflectId) -> Self {
        Self {
            id,
            indices: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ReflectId {
        self.id
    }

    #[inline]
    pub fn indices(&self) -> &[DependencyIndex] {
        &self.indices
    }

    #[inline]
    pub fn push(&mut self, index: DependencyIndex) {
        self.indices.push(index);
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }
}

// -----------------------------------------------------------------------------
// SerializedReflectionObject

/// The fields one type of an object's hierarchy saved.
///
/// Every `add_*` method returns the existing entry when a field of the same
/// id and shape already exists.
///
/// # Examples
///
/// ```
/// use vc_serial::ReflectId;
/// use vc_serial::serialized::SerializedReflectionObject;
///
/// let mut saved = SerializedReflectionObject::new();
/// saved.add_value(ReflectId::of("count")).set(&3_i32).unwrap();
///
/// saved.change_field_id(ReflectId::of("count"), ReflectId::of("total"));
///
/// let total = saved.value(ReflectId::of("total")).unwrap();
/// assert_eq!(total.initialize::<i32>().unwrap(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializedReflectionObject {
    values: Vec<SerializedValue>,
    pointers: Vec<SerializedPointer>,
    arrays_of_values: Vec<SerializedArrayOfValues>,
    arrays_of_pointers: Vec<SerializedArrayOfPointers>,
}

fn find_or_insert<T>(
    list: &mut Vec<T>,
    id: ReflectId,
    id_of: fn(&T) -> ReflectId,
    make: fn(ReflectId) -> T,
) -> &mut T {
    let index = match list.iter().position(|item| id_of(item) == id) {
        Some(index) => index,
        None => {
            list.push(make(id));
            list.len() - 1
        }
    };
    &mut list[index]
}

impl SerializedReflectionObject {
    #[inline]
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            pointers: Vec::new(),
            arrays_of_values: Vec::new(),
            arrays_of_pointers: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
            && self.pointers.is_empty()
            && self.arrays_of_values.is_empty()
            && self.arrays_of_pointers.is_empty()
    }

    /// Adds an empty field of the given shape.
    pub fn add_field(&mut self, id: ReflectId, shape: FieldShape) {
        match shape {
            FieldShape::Value => {
                self.add_value(id);
            }
            FieldShape::Pointer => {
                self.add_pointer(id);
            }
            FieldShape::ArrayOfValues => {
                self.add_array_of_values(id);
            }
            FieldShape::ArrayOfPointers => {
                self.add_array_of_pointers(id);
            }
        }
    }

    pub fn add_value(&mut self, id: ReflectId) -> &mut SerializedValue {
        find_or_insert(&mut self.values, id, SerializedValue::id, SerializedValue::new)
    }

    pub fn add_pointer(&mut self, id: ReflectId) -> &mut SerializedPointer {
        find_or_insert(&mut self.pointers, id, SerializedPointer::id, SerializedPointer::new)
    }

    pub fn add_array_of_values(&mut self, id: ReflectId) -> &mut SerializedArrayOfValues {
        find_or_insert(
            &mut self.arrays_of_values,
            id,
            SerializedArrayOfValues::id,
            SerializedArrayOfValues::new,
        )
    }

    pub fn add_array_of_pointers(&mut self, id: ReflectId) -> &mut SerializedArrayOfPointers {
        find_or_insert(
            &mut self.arrays_of_pointers,
            id,
            SerializedArrayOfPointers::id,
            SerializedArrayOfPointers::new,
        )
    }

    /// Removes every field with the given id, returns whether one existed.
    pub fn remove_field(&mut self, id: ReflectId) -> bool {
        let before = self.field_count();
        self.values.retain(|f| f.id != id);
        self.pointers.retain(|f| f.id != id);
        self.arrays_of_values.retain(|f| f.id != id);
        self.arrays_of_pointers.retain(|f| f.id != id);
        before != self.field_count()
    }

    /// Renames a field, returns whether one was renamed.
    pub fn change_field_id(&mut self, old: ReflectId, new: ReflectId) -> bool {
        let mut changed = false;
        for field in self.values.iter_mut().filter(|f| f.id == old) {
            field.id = new;
            changed = true;
        }
        for field in self.pointers.iter_mut().filter(|f| f.id == old) {
            field.id = new;
            changed = true;
        }
        for field in self.arrays_of_values.iter_mut().filter(|f| f.id == old) {
            field.id = new;
            changed = true;
        }
        for field in self.arrays_of_pointers.iter_mut().filter(|f| f.id == old) {
            field.id = new;
            changed = true;
        }
        changed
    }

    pub fn field_count(&self) -> usize {
        self.values.len()
            + self.pointers.len()
            + self.arrays_of_values.len()
            + self.arrays_of_pointers.len()
    }

    /// The shape of a stored field.
    pub fn field_shape(&self, id: ReflectId) -> Option<FieldShape> {
        if self.value(id).is_some() {
            Some(FieldShape::Value)
        } else if self.pointer(id).is_some() {
            Some(FieldShape::Pointer)
        } else if self.array_of_values(id).is_some() {
            Some(FieldShape::ArrayOfValues)
        } else if self.array_of_pointers(id).is_some() {
            Some(FieldShape::ArrayOfPointers)
        } else {
            None
        }
    }

    pub fn value(&self, id: ReflectId) -> Option<&SerializedValue> {
        self.values.iter().find(|f| f.id == id)
    }

    pub fn value_mut(&mut self, id: ReflectId) -> Option<&mut SerializedValue> {
        self.values.iter_mut().find(|f| f.id == id)
    }

    #[inline]
    pub fn value_by_name(&self, name: &str) -> Option<&SerializedValue> {
        self.value(ReflectId::of(name))
    }

    #[inline]
    pub fn value_by_name_mut(&mut self, name: &str) -> Option<&mut SerializedValue> {
        self.value_mut(ReflectId::of(name))
    }

    pub fn pointer(&self, id: ReflectId) -> Option<&SerializedPointer> {
        self.pointers.iter().find(|f| f.id == id)
    }

    pub fn pointer_mut(&mut self, id: ReflectId) -> Option<&mut SerializedPointer> {
        self.pointers.iter_mut().find(|f| f.id == id)
    }

    pub fn array_of_values(&self, id: ReflectId) -> Option<&SerializedArrayOfValues> {
        self.arrays_of_values.iter().find(|f| f.id == id)
    }

    pub fn array_of_values_mut(&mut self, id: ReflectId) -> Option<&mut SerializedArrayOfValues> {
        self.arrays_of_values.iter_mut().find(|f| f.id == id)
    }

    pub fn array_of_pointers(&self, id: ReflectId) -> Option<&SerializedArrayOfPointers> {
        self.arrays_of_pointers.iter().find(|f| f.id == id)
    }

    pub fn array_of_pointers_mut(
        &mut self,
        id: ReflectId,
    ) -> Option<&mut SerializedArrayOfPointers> {
        self.arrays_of_pointers.iter_mut().find(|f| f.id == id)
    }

    pub fn values(&self) -> &[SerializedValue] {
        &self.values
    }

    pub fn pointers(&self) -> &[SerializedPointer] {
        &self.pointers
    }

    // -------------------------------------------------------------------------
    // Stream format

    pub fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        out.write_len(self.values.len())?;
        for value in &self.values {
            out.write_u32(value.id.to_raw())?;
            out.write_bytes(&value.bytes)?;
        }

        out.write_len(self.pointers.len())?;
        for pointer in &self.pointers {
            out.write_u32(pointer.id.to_raw())?;
            out.write_u32(pointer.index.to_raw())?;
        }

        out.write_len(self.arrays_of_values.len())?;
        for array in &self.arrays_of_values {
            out.write_u32(array.id.to_raw())?;
            out.write_bytes(&array.buffer)?;
            out.write_len(array.offsets.len())?;
            for offset in &array.offsets {
                out.write_u32(*offset)?;
            }
        }

        out.write_len(self.arrays_of_pointers.len())?;
        for array in &self.arrays_of_pointers {
            out.write_u32(array.id.to_raw())?;
            out.write_len(array.indices.len())?;
            for index in &array.indices {
                out.write_u32(index.to_raw())?;
            }
        }
        Ok(())
    }

    pub fn load(input: &mut dyn InStream) -> Result<Self> {
        let mut object = Self::new();

        for _ in 0..input.read_len()? {
            let id = ReflectId::from_raw(input.read_u32()?);
            let bytes = input.read_bytes()?;
            object.values.push(SerializedValue { id, bytes });
        }

        for _ in 0..input.read_len()? {
            let id = ReflectId::from_raw(input.read_u32()?);
            let index = DependencyIndex::from_raw(input.read_u32()?);
            object.pointers.push(SerializedPointer { id, index });
        }

        for _ in 0..input.read_len()? {
            let id = ReflectId::from_raw(input.read_u32()?);
            let buffer = input.read_bytes()?;
            let count = input.read_len()?;
            let mut offsets = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                offsets.push(input.read_u32()?);
            }
            object.arrays_of_values.push(SerializedArrayOfValues {
                id,
                buffer,
                offsets,
            });
        }

        for _ in 0..input.read_len()? {
            let id = ReflectId::from_raw(input.read_u32()?);
            let count = input.read_len()?;
            let mut indices = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                indices.push(DependencyIndex::from_raw(input.read_u32()?));
            }
            object.arrays_of_pointers.push(SerializedArrayOfPointers { id, indices });
        }

        Ok(object)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    fn id(name: &str) -> ReflectId {
        ReflectId::of(name)
    }

    #[test]
    fn fields_are_deduplicated_by_id() {
        let mut saved = SerializedReflectionObject::new();
        saved.add_value(id("a")).set(&1_u8).unwrap();
        saved.add_value(id("a")).set(&2_u8).unwrap();
        assert_eq!(saved.field_count(), 1);
        assert_eq!(saved.value(id("a")).unwrap().initialize::<u8>().unwrap(), 2);

        saved.add_field(id("a"), FieldShape::Value);
        assert_eq!(saved.field_count(), 1);
        saved.add_field(id("p"), FieldShape::Pointer);
        assert_eq!(saved.field_shape(id("p")), Some(FieldShape::Pointer));
        assert!(saved.pointer(id("p")).unwrap().index().is_null());
    }

    #[test]
    fn remove_and_rename() {
        let mut saved = SerializedReflectionObject::new();
        saved.add_value(id("old")).set(&String::from("x")).unwrap();
        saved.add_array_of_pointers(id("links")).push(DependencyIndex::internal(0));

        assert!(saved.change_field_id(id("old"), id("new")));
        assert!(!saved.change_field_id(id("missing"), id("other")));
        assert!(saved.value(id("old")).is_none());
        assert_eq!(
            saved.value_by_name("new").unwrap().initialize::<String>().unwrap(),
            "x"
        );

        assert!(saved.remove_field(id("links")));
        assert!(!saved.remove_field(id("links")));
        assert_eq!(saved.field_count(), 1);
    }

    #[test]
    fn array_elements_are_addressable() {
        let mut array = SerializedArrayOfValues::new(id("names"));
        array.push(&String::from("first")).unwrap();
        array.push(&String::from("")).unwrap();
        array.push(&String::from("third")).unwrap();

        assert_eq!(array.len(), 3);
        assert_eq!(array.get::<String>(2).unwrap().unwrap(), "third");
        assert!(array.get::<String>(3).is_none());
        assert_eq!(array.to_vec::<String>().unwrap(), ["first", "", "third"]);
    }

    #[test]
    fn undecodable_elements_fail_the_whole_array() {
        let mut array = SerializedArrayOfValues::new(id("letters"));
        array.push(&'a').unwrap();
        array.push(&0xD800_u32).unwrap();
        array.push(&'c').unwrap();

        assert_eq!(array.get::<char>(0).unwrap().unwrap(), 'a');
        assert!(matches!(
            array.to_vec::<char>(),
            Err(SerialError::InvalidChar(0xD800))
        ));
        assert_eq!(array.to_vec::<u32>().unwrap().len(), 3);

        let broken = SerializedArrayOfValues {
            id: id("broken"),
            buffer: vec![0; 4],
            offsets: vec![0, 8],
        };
        assert!(matches!(
            broken.to_vec::<u32>(),
            Err(SerialError::BadArrayOffset(0))
        ));
    }

    #[test]
    fn stream_format_preserves_every_list() {
        let mut saved = SerializedReflectionObject::new();
        saved.add_value(id("v")).set(&-5_i64).unwrap();
        saved.add_pointer(id("p")).set(DependencyIndex::external(3));
        saved.add_array_of_values(id("a")).push(&1.5_f32).unwrap();
        saved.add_array_of_pointers(id("ap")).push(DependencyIndex::NULL);

        let mut bytes = Vec::new();
        saved.save(&mut OutArrayStream::new(&mut bytes)).unwrap();

        let mut input = InRawArrayStream::new(&bytes);
        let loaded = SerializedReflectionObject::load(&mut input).unwrap();
        assert!(input.is_at_end());
        assert_eq!(loaded, saved);
    }
}
