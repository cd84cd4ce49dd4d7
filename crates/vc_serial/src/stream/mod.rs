//! Byte-level stream codec.
//!
//! - [`OutStream`] / [`InStream`]: the raw byte sinks and sources.
//! - [`OutArrayStream`], [`InArrayStream`], [`InRawArrayStream`]: memory backed streams.
//! - [`OutFileStream`], [`InFileStream`]: streams over files opened through a
//!   [`Filesystem`](crate::fs::Filesystem).
//! - [`StreamValue`]: values that know how to write and read themselves.
//!
//! Integers are written in the host's native byte order. Variable length
//! data is prefixed with a `u32` length.

// -----------------------------------------------------------------------------
// Modules

mod array_stream;
mod file_stream;
mod in_stream;
mod out_stream;
mod value;

// -----------------------------------------------------------------------------
// Exports

pub use array_stream::{InArrayStream, InRawArrayStream, OutArrayStream};
pub use file_stream::{InFileStream, OutFileStream};
pub use in_stream::InStream;
pub use out_stream::OutStream;
pub use value::StreamValue;
