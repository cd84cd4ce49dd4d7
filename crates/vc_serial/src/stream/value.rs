use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::fs::FilePath;
use crate::object::UniqueId;
use crate::stream::{InStream, OutStream};
use crate::{Result, SerialError};

// -----------------------------------------------------------------------------
// StreamValue

/// A value that can be written to and read from a stream.
///
/// Implemented for the primitive numbers, `bool`, `char`, strings,
/// [`FilePath`], [`UniqueId`], `Option<T>`, `Vec<T>` and `Arc<T>`.
///
/// `Arc<T>` is written as the value it shares, loading creates a new
/// shared value.
///
/// # Examples
///
/// ```
/// use vc_serial::stream::{InRawArrayStream, OutArrayStream, StreamValue};
///
/// let mut bytes = Vec::new();
/// vec![1.5_f32, 2.5].save(&mut OutArrayStream::new(&mut bytes)).unwrap();
///
/// let loaded = Vec::<f32>::load(&mut InRawArrayStream::new(&bytes)).unwrap();
/// assert_eq!(loaded, [1.5, 2.5]);
/// ```
pub trait StreamValue: Sized + Send + Sync + 'static {
    fn save(&self, out: &mut dyn OutStream) -> Result<()>;

    fn load(input: &mut dyn InStream) -> Result<Self>;
}

macro_rules! impl_numeric {
    ($($ty:ty),* $(,)?) => {$(
        impl StreamValue for $ty {
            #[inline]
            fn save(&self, out: &mut dyn OutStream) -> Result<()> {
                out.save(&self.to_ne_bytes())
            }

            #[inline]
            fn load(input: &mut dyn InStream) -> Result<Self> {
                let mut buffer = [0_u8; size_of::<$ty>()];
                input.load(&mut buffer)?;
                Ok(<$ty>::from_ne_bytes(buffer))
            }
        }
    )*};
}

impl_numeric!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// Pointer sized integers are stored as 64-bit values.

impl StreamValue for usize {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        (*self as u64).save(out)
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        let raw = u64::load(input)?;
        usize::try_from(raw).map_err(|_| SerialError::IntegerOverflow(raw.into()))
    }
}

impl StreamValue for isize {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        (*self as i64).save(out)
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        let raw = i64::load(input)?;
        isize::try_from(raw).map_err(|_| SerialError::IntegerOverflow(raw.into()))
    }
}

impl StreamValue for bool {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        out.write_u8(*self as u8)
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        Ok(input.read_u8()? != 0)
    }
}

impl StreamValue for char {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        out.write_u32(*self as u32)
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        let raw = input.read_u32()?;
        char::from_u32(raw).ok_or(SerialError::InvalidChar(raw))
    }
}

impl StreamValue for String {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        out.write_str(self)
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        input.read_string()
    }
}

impl StreamValue for FilePath {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        out.write_str(self.as_str())
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        Ok(FilePath::new(input.read_string()?))
    }
}

impl StreamValue for UniqueId {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        out.write_str(self.as_str())
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        Ok(UniqueId::new(input.read_string()?))
    }
}

impl<T: StreamValue> StreamValue for Option<T> {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        match self {
            None => out.write_u8(0),
            Some(value) => {
                out.write_u8(1)?;
                value.save(out)
            }
        }
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        match input.read_u8()? {
            0 => Ok(None),
            _ => T::load(input).map(Some),
        }
    }
}

impl<T: StreamValue> StreamValue for Vec<T> {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        out.write_len(self.len())?;
        for item in self {
            item.save(out)?;
        }
        Ok(())
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        let count = input.read_len()?;
        // Grow while reading, the count is untrusted.
        let mut items = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            items.push(T::load(input)?);
        }
        Ok(items)
    }
}

impl<T: StreamValue> StreamValue for Arc<T> {
    fn save(&self, out: &mut dyn OutStream) -> Result<()> {
        (**self).save(out)
    }

    fn load(input: &mut dyn InStream) -> Result<Self> {
        T::load(input).map(Arc::new)
    }
}

// -----------------------------------------------------------------------------
// Tests
