use alloc::string::String;
use alloc::vec::Vec;

use crate::{Result, SerialError};

/// Upper bound for a single read while draining large blocks.
const CHUNK_SIZE: usize = 64 * 1024;

// -----------------------------------------------------------------------------
// InStream

/// A byte source.
///
/// Reading past the end is reported as [`SerialError::UnexpectedEof`].
pub trait InStream {
    /// Fills `buffer` completely.
    fn load(&mut self, buffer: &mut [u8]) -> Result<()>;

    /// Skips `count` bytes.
    fn skip(&mut self, count: usize) -> Result<()> {
        let mut scratch = [0_u8; 256];
        let mut left = count;
        while left > 0 {
            let step = left.min(scratch.len());
            self.load(&mut scratch[..step])?;
            left -= step;
        }
        Ok(())
    }

    /// Reads exactly `len` bytes into a new buffer.
    ///
    /// The buffer grows while reading, a corrupted length can not
    /// trigger a huge allocation up front.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len.min(CHUNK_SIZE));
        while bytes.len() < len {
            let start = bytes.len();
            let step = (len - start).min(CHUNK_SIZE);
            bytes.resize(start + step, 0);
            self.load(&mut bytes[start..])?;
        }
        Ok(bytes)
    }

    #[inline]
    fn read_u8(&mut self) -> Result<u8> {
        let mut buffer = [0_u8; 1];
        self.load(&mut buffer)?;
        Ok(buffer[0])
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32> {
        let mut buffer = [0_u8; 4];
        self.load(&mut buffer)?;
        Ok(u32::from_ne_bytes(buffer))
    }

    #[inline]
    fn read_i32(&mut self) -> Result<i32> {
        let mut buffer = [0_u8; 4];
        self.load(&mut buffer)?;
        Ok(i32::from_ne_bytes(buffer))
    }

    /// Reads a `u32` length prefix.
    #[inline]
    fn read_len(&mut self) -> Result<usize> {
        Ok(self.read_u32()? as usize)
    }

    /// Reads a length-prefixed byte block.
    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_len()?;
        self.read_vec(len)
    }

    /// Reads a length-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(SerialError::from)
    }
}

impl<S: InStream + ?Sized> InStream for &mut S {
    #[inline]
    fn load(&mut self, buffer: &mut [u8]) -> Result<()> {
        (**self).load(buffer)
    }

    #[inline]
    fn skip(&mut self, count: usize) -> Result<()> {
        (**self).skip(count)
    }
}
