use alloc::string::{FromUtf8Error, String};

use thiserror::Error;

use crate::ReflectId;
use crate::fs::FilePath;

// -----------------------------------------------------------------------------
// Result

/// Result alias used by stream, archive and filesystem operations.
pub type Result<T, E = SerialError> = core::result::Result<T, E>;

// -----------------------------------------------------------------------------
// SerialError

/// Errors raised while encoding or decoding archives.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerialError {
    #[error("unexpected end of stream, {needed} more bytes were required")]
    UnexpectedEof { needed: usize },

    #[error("invalid archive magic number {found:#010x}")]
    BadMagic { found: u32 },

    #[error("length {0} does not fit a 32-bit length prefix")]
    LengthOverflow(usize),

    #[error("stored string is not valid UTF-8")]
    InvalidUtf8(#[from] FromUtf8Error),

    #[error("stored value {0:#x} is not a valid char")]
    InvalidChar(u32),

    #[error("stored value {0} does not fit the target integer type")]
    IntegerOverflow(i128),

    #[error("element {0} of a value array lies outside its buffer")]
    BadArrayOffset(usize),

    #[error("type {0} is not registered")]
    UnknownType(ReflectId),

    #[error("file `{0}` does not exist")]
    FileNotFound(FilePath),

    #[error("path `{0}` leaves the filesystem root")]
    PathEscapesRoot(FilePath),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// -----------------------------------------------------------------------------
// RegistryError

/// Errors raised while finalizing a [`TypesRegistry`](crate::types::TypesRegistry).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    #[error("the types registry has already been built")]
    AlreadyBuilt,

    #[error("type `{child}` derives from unregistered type {parent}")]
    UnknownParent { child: String, parent: ReflectId },
}

// -----------------------------------------------------------------------------
// PatchError

/// Errors raised while reading patch definitions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PatchError {
    #[error("failed to parse patch definitions: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("migration function `{0}` is not registered")]
    UnknownMigrationFn(String),

    #[error("patch `{old_type}`@{old_version} -> `{new_type}`@{new_version} does not advance the version")]
    NonIncreasingVersion {
        old_type: String,
        old_version: i32,
        new_type: String,
        new_version: i32,
    },
}
