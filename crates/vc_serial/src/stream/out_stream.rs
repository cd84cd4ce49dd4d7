use crate::{Result, SerialError};

// -----------------------------------------------------------------------------
// OutStream

/// A byte sink.
///
/// Only [`save`](OutStream::save) must be provided, the typed helpers are
/// built on top of it.
pub trait OutStream {
    /// Writes all of `bytes`.
    fn save(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flushes buffered data to the underlying storage.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    #[inline]
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.save(&[value])
    }

    #[inline]
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.save(&value.to_ne_bytes())
    }

    #[inline]
    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.save(&value.to_ne_bytes())
    }

    /// Writes a length as a `u32` prefix.
    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| SerialError::LengthOverflow(len))?;
        self.write_u32(len)
    }

    /// Writes a length-prefixed byte block.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_len(bytes.len())?;
        self.save(bytes)
    }

    /// Writes a length-prefixed UTF-8 string.
    #[inline]
    fn write_str(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }
}

impl<S: OutStream + ?Sized> OutStream for &mut S {
    #[inline]
    fn save(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).save(bytes)
    }

    #[inline]
    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
