//! Type registry and per-field type components.
//!
//! - [`Reflected`] / [`TypeBuilder`]: how a Rust type describes its layout.
//! - [`SerializableReflectionType`]: the registered layout.
//! - [`TypeComponent`] / [`FieldCodec`]: one member field and its codec.
//! - [`ReflectedEnum`] / [`EnumReflectionType`]: enums archived by value.
//! - [`TypesRegistry`]: the store of every registered type.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod codec;
mod component;
mod enumeration;
mod reflection_type;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use builder::{Reflected, TypeBuilder};
pub use codec::{
    EnumField, FieldCodec, PointerArrayField, PointerField, ValueArrayField, ValueField,
    WeakPointerField,
};
pub use component::{ComponentTraits, FieldShape, TypeComponent};
pub use enumeration::{EnumReflectionType, ReflectedEnum};
pub use reflection_type::{Instantiator, ParentTypeDesc, ReflectionType, SerializableReflectionType};
pub use registry::TypesRegistry;

#[doc(hidden)]
pub use registry::register_one;

#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub use registry::AutoRegisterFunc;
