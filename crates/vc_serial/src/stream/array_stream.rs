use alloc::vec::Vec;

use crate::stream::{InStream, OutStream};
use crate::{Result, SerialError};

// -----------------------------------------------------------------------------
// OutArrayStream

/// An [`OutStream`] appending to a byte vector.
///
/// # Examples
///
/// ```
/// use vc_serial::stream::{OutArrayStream, OutStream};
///
/// let mut bytes = Vec::new();
/// let mut stream = OutArrayStream::new(&mut bytes);
/// stream.write_u32(7).unwrap();
///
/// assert_eq!(bytes, 7_u32.to_ne_bytes());
/// ```
pub struct OutArrayStream<'a> {
    buffer: &'a mut Vec<u8>,
}

impl<'a> OutArrayStream<'a> {
    #[inline]
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self { buffer }
    }

    /// Number of bytes written so far, including what the buffer held before.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }
}

impl OutStream for OutArrayStream<'_> {
    #[inline]
    fn save(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// InRawArrayStream

/// An [`InStream`] over borrowed bytes.
pub struct InRawArrayStream<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> InRawArrayStream<'a> {
    #[inline]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    #[inline]
    pub const fn is_at_end(&self) -> bool {
        self.position == self.bytes.len()
    }
}

impl InStream for InRawArrayStream<'_> {
    fn load(&mut self, buffer: &mut [u8]) -> Result<()> {
        let end = self.position + buffer.len();
        let Some(source) = self.bytes.get(self.position..end) else {
            return Err(SerialError::UnexpectedEof {
                needed: end - self.bytes.len(),
            });
        };
        buffer.copy_from_slice(source);
        self.position = end;
        Ok(())
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        if count > self.remaining() {
            return Err(SerialError::UnexpectedEof {
                needed: count - self.remaining(),
            });
        }
        self.position += count;
        Ok(())
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > self.remaining() {
            return Err(SerialError::UnexpectedEof {
                needed: len - self.remaining(),
            });
        }
        let bytes = self.bytes[self.position..self.position + len].to_vec();
        self.position += len;
        Ok(bytes)
    }
}

// -----------------------------------------------------------------------------
// InArrayStream

/// An [`InStream`] owning its bytes.
///
/// # Examples
///
/// ```
/// use vc_serial::stream::{InArrayStream, InStream};
///
/// let mut stream = InArrayStream::new(7_u32.to_ne_bytes().to_vec());
/// assert_eq!(stream.read_u32().unwrap(), 7);
/// assert!(stream.read_u32().is_err());
/// ```
pub struct InArrayStream {
    bytes: Vec<u8>,
    position: usize,
}

impl InArrayStream {
    #[inline]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, position: 0 }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    /// Moves the read cursor back to the first byte.
    #[inline]
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    fn as_raw(&self) -> InRawArrayStream<'_> {
        InRawArrayStream {
            bytes: &self.bytes,
            position: self.position,
        }
    }
}

impl InStream for InArrayStream {
    fn load(&mut self, buffer: &mut [u8]) -> Result<()> {
        let mut raw = self.as_raw();
        raw.load(buffer)?;
        self.position = raw.position;
        Ok(())
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        let mut raw = self.as_raw();
        raw.skip(count)?;
        self.position = raw.position;
        Ok(())
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut raw = self.as_raw();
        let bytes = raw.read_vec(len)?;
        self.position = raw.position;
        Ok(bytes)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_are_length_prefixed() {
        let mut bytes = Vec::new();
        let mut out = OutArrayStream::new(&mut bytes);
        out.write_str("abc").unwrap();
        assert_eq!(out.len(), 7);

        assert_eq!(&bytes[..4], &3_u32.to_ne_bytes());
        assert_eq!(&bytes[4..], b"abc");

        let mut input = InRawArrayStream::new(&bytes);
        assert_eq!(input.read_string().unwrap(), "abc");
        assert!(input.is_at_end());
    }

    #[test]
    fn reads_past_the_end_fail_without_moving() {
        let bytes = [1_u8, 2, 3];
        let mut input = InRawArrayStream::new(&bytes);
        assert!(matches!(
            input.read_u32(),
            Err(SerialError::UnexpectedEof { needed: 1 })
        ));
        assert_eq!(input.position(), 0);

        input.skip(2).unwrap();
        assert_eq!(input.read_u8().unwrap(), 3);
        assert!(input.skip(1).is_err());
    }

    #[test]
    fn owned_stream_tracks_position() {
        let mut bytes = Vec::new();
        let mut out = OutArrayStream::new(&mut bytes);
        out.write_u32(1).unwrap();
        out.write_i32(-2).unwrap();
        out.write_bytes(&[9, 9]).unwrap();

        let mut input = InArrayStream::new(bytes);
        input.skip(4).unwrap();
        assert_eq!(input.read_i32().unwrap(), -2);
        assert_eq!(input.read_bytes().unwrap(), [9, 9]);
        assert_eq!(input.remaining(), 0);

        input.rewind();
        assert_eq!(input.read_u32().unwrap(), 1);
    }

    #[test]
    fn corrupted_length_is_rejected() {
        let mut bytes = Vec::new();
        OutArrayStream::new(&mut bytes).write_u32(u32::MAX).unwrap();
        let mut input = InRawArrayStream::new(&bytes);
        assert!(input.read_bytes().is_err());
    }
}
