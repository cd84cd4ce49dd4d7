//! Object types shared by the unit tests.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::SerialContext;
use crate::fs::FilePath;
use crate::object::{Link, ObjectHeader, ObjectRef, ReflectionObject, Resource, WeakLink};
use crate::types::{FieldShape, Reflected, ReflectedEnum, TypeBuilder};

macro_rules! impl_object {
    ($ty:ty) => {
        impl ReflectionObject for $ty {
            fn header(&self) -> &ObjectHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut ObjectHeader {
                &mut self.header
            }
        }
    };
}

// -----------------------------------------------------------------------------
// TestNode

#[derive(Default)]
pub struct TestNode {
    pub header: ObjectHeader,
    pub value: i32,
    pub next: Link,
    pub friend: WeakLink,
    pub numbers: Vec<f32>,
    pub children: Vec<Link>,
    pub label: Arc<String>,
    pub pre_saves: u32,
    pub loaded: bool,
}

impl TestNode {
    pub fn named(unique_id: &str, value: i32) -> Self {
        Self {
            header: ObjectHeader::with_unique_id(unique_id),
            value,
            ..Default::default()
        }
    }

    pub fn with_next(mut self, next: &ObjectRef) -> Self {
        self.next = Link::new(next.clone());
        self
    }
}

impl Reflected for TestNode {
    const TYPE_NAME: &'static str = "TestNode";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.instantiable();
        ty.field("value", |n| &n.value, |n| &mut n.value)
            .set_editable("Value");
        ty.pointer("next", |n| &n.next, |n| &mut n.next);
        ty.weak_pointer("friend", |n| &n.friend, |n| &mut n.friend);
        ty.array("numbers", |n| &n.numbers, |n| &mut n.numbers);
        ty.pointer_array("children", |n| &n.children, |n| &mut n.children);
        ty.field("label", |n| &n.label, |n| &mut n.label);
        ty.field("pre_saves", |n| &n.pre_saves, |n| &mut n.pre_saves)
            .set_runtime();
    }
}

impl ReflectionObject for TestNode {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ObjectHeader {
        &mut self.header
    }

    fn on_object_pre_save(&mut self) {
        self.pre_saves += 1;
    }

    fn on_object_loaded(&mut self) {
        self.loaded = true;
    }
}

// -----------------------------------------------------------------------------
// TestBase / TestDerived

#[derive(Default)]
pub struct TestBase {
    pub id: u32,
    pub tag: String,
}

impl Reflected for TestBase {
    const TYPE_NAME: &'static str = "TestBase";
    const VERSION: i32 = 3;

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.field("id", |b| &b.id, |b| &mut b.id);
        ty.field("tag", |b| &b.tag, |b| &mut b.tag);
    }
}

#[derive(Default)]
pub struct TestDerived {
    pub header: ObjectHeader,
    pub base: TestBase,
    pub extra: f32,
}

impl Reflected for TestDerived {
    const TYPE_NAME: &'static str = "TestDerived";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.instantiable();
        ty.parent(|d| &d.base, |d| &mut d.base);
        ty.field("extra", |d| &d.extra, |d| &mut d.extra);
    }
}

impl_object!(TestDerived);

// -----------------------------------------------------------------------------
// TestTexture / TestMaterial

#[derive(Default)]
pub struct TestTexture {
    pub header: ObjectHeader,
    pub path: FilePath,
}

impl TestTexture {
    pub fn new(path: &str) -> Self {
        Self {
            header: ObjectHeader::with_unique_id(path),
            path: FilePath::new(path),
        }
    }
}

impl Reflected for TestTexture {
    const TYPE_NAME: &'static str = "TestTexture";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.instantiable();
        ty.field("path", |t| &t.path, |t| &mut t.path);
    }
}

impl ReflectionObject for TestTexture {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ObjectHeader {
        &mut self.header
    }

    fn as_resource(&self) -> Option<&dyn Resource> {
        Some(self)
    }
}

impl Resource for TestTexture {
    fn file_path(&self) -> &FilePath {
        &self.path
    }
}

#[derive(Default)]
pub struct TestMaterial {
    pub header: ObjectHeader,
    pub diffuse: Link,
    pub normal: Link,
}

impl TestMaterial {
    pub fn new(unique_id: &str, diffuse: &ObjectRef, normal: &ObjectRef) -> Self {
        Self {
            header: ObjectHeader::with_unique_id(unique_id),
            diffuse: Link::new(diffuse.clone()),
            normal: Link::new(normal.clone()),
        }
    }
}

impl Reflected for TestMaterial {
    const TYPE_NAME: &'static str = "TestMaterial";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.instantiable();
        ty.pointer("diffuse", |m| &m.diffuse, |m| &mut m.diffuse);
        ty.pointer("normal", |m| &m.normal, |m| &mut m.normal);
    }
}

impl_object!(TestMaterial);

/// A resource that points to another resource.
#[derive(Default)]
pub struct TestAtlas {
    pub header: ObjectHeader,
    pub path: FilePath,
    pub page: Link,
}

impl TestAtlas {
    pub fn new(path: &str, page: &ObjectRef) -> Self {
        Self {
            header: ObjectHeader::with_unique_id(path),
            path: FilePath::new(path),
            page: Link::new(page.clone()),
        }
    }
}

impl Reflected for TestAtlas {
    const TYPE_NAME: &'static str = "TestAtlas";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.instantiable();
        ty.field("path", |a| &a.path, |a| &mut a.path);
        ty.pointer("page", |a| &a.page, |a| &mut a.page);
    }
}

impl ReflectionObject for TestAtlas {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut ObjectHeader {
        &mut self.header
    }

    fn as_resource(&self) -> Option<&dyn Resource> {
        Some(self)
    }
}

impl Resource for TestAtlas {
    fn file_path(&self) -> &FilePath {
        &self.path
    }
}

/// A context with every test type above.
pub fn test_context() -> SerialContext {
    SerialContext::builder()
        .with_type::<TestNode>()
        .with_type::<TestBase>()
        .with_type::<TestDerived>()
        .with_type::<TestTexture>()
        .with_type::<TestMaterial>()
        .with_type::<TestAtlas>()
        .build()
        .unwrap()
}

// -----------------------------------------------------------------------------
// OldWidget / Widget

/// The first generation of `Widget`.
#[derive(Default)]
pub struct OldWidget {
    pub header: ObjectHeader,
    pub count: i32,
}

impl Reflected for OldWidget {
    const TYPE_NAME: &'static str = "OldWidget";

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.instantiable();
        ty.field("count", |w| &w.count, |w| &mut w.count);
    }
}

impl_object!(OldWidget);

/// `OldWidget` renamed, with `count` renamed to `amount` and a new `label`.
pub struct Widget {
    pub header: ObjectHeader,
    pub amount: i32,
    pub label: String,
}

impl Default for Widget {
    fn default() -> Self {
        Self {
            header: ObjectHeader::default(),
            amount: 0,
            label: String::from("unnamed"),
        }
    }
}

impl Reflected for Widget {
    const TYPE_NAME: &'static str = "Widget";
    const VERSION: i32 = 1;

    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.instantiable();
        ty.field("amount", |w| &w.amount, |w| &mut w.amount);
        ty.field("label", |w| &w.label, |w| &mut w.label);
    }
}

impl_object!(Widget);

/// Contexts before and after the `OldWidget` to `Widget` migration.
pub fn widget_contexts() -> (SerialContext, SerialContext) {
    let old = SerialContext::builder()
        .with_type::<OldWidget>()
        .build()
        .unwrap();

    let new = SerialContext::builder()
        .with_type::<Widget>()
        .with_patches(|patches| {
            patches
                .add_patch("", -1, "OldWidget", 0)
                .add_field("count", FieldShape::Value);
            patches
                .add_patch("OldWidget", 0, "Widget", 1)
                .change_field("count", "amount")
                .add_field("label", FieldShape::Value);
        })
        .build()
        .unwrap();

    (old, new)
}

// -----------------------------------------------------------------------------
// WeekDays / WeekEnd

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekDays {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl ReflectedEnum for WeekDays {
    const TYPE_NAME: &'static str = "WeekDays";
    const ENUMERATORS: &'static [(&'static str, Self)] = &[
        ("Monday", Self::Monday),
        ("Tuesday", Self::Tuesday),
        ("Wednesday", Self::Wednesday),
        ("Thursday", Self::Thursday),
        ("Friday", Self::Friday),
    ];

    fn value(self) -> i32 {
        self as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeekEnd {
    #[default]
    Sunday = 1,
    Saturday = 7,
}

impl ReflectedEnum for WeekEnd {
    const TYPE_NAME: &'static str = "WeekEnd";
    const ENUMERATORS: &'static [(&'static str, Self)] =
        &[("Sunday", Self::Sunday), ("Saturday", Self::Saturday)];

    fn value(self) -> i32 {
        self as i32
    }
}
