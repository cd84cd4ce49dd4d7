use alloc::boxed::Box;
use std::io::{self, BufReader, BufWriter, Read, Write};

use crate::stream::{InStream, OutStream};
use crate::{Result, SerialError};

// -----------------------------------------------------------------------------
// OutFileStream

/// An [`OutStream`] writing into a file handle.
///
/// Writes are buffered, call [`OutStream::flush`] to make sure every byte
/// reached the file before it is read back.
pub struct OutFileStream<'a> {
    writer: BufWriter<Box<dyn Write + Send + 'a>>,
}

impl<'a> OutFileStream<'a> {
    pub fn new(file: Box<dyn Write + Send + 'a>) -> Self {
        Self {
            writer: BufWriter::new(file),
        }
    }
}

impl OutStream for OutFileStream<'_> {
    #[inline]
    fn save(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// InFileStream

/// An [`InStream`] reading from a file handle.
pub struct InFileStream<'a> {
    reader: BufReader<Box<dyn Read + Send + 'a>>,
}

impl<'a> InFileStream<'a> {
    pub fn new(file: Box<dyn Read + Send + 'a>) -> Self {
        Self {
            reader: BufReader::new(file),
        }
    }
}

impl InStream for InFileStream<'_> {
    fn load(&mut self, buffer: &mut [u8]) -> Result<()> {
        match self.reader.read_exact(buffer) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(SerialError::UnexpectedEof {
                    needed: buffer.len(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn skip(&mut self, count: usize) -> Result<()> {
        let copied = io::copy(&mut (&mut self.reader).take(count as u64), &mut io::sink())?;
        if copied < count as u64 {
            return Err(SerialError::UnexpectedEof {
                needed: count - copied as usize,
            });
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use std::io::Cursor;

    #[test]
    fn file_streams_round_trip_through_a_cursor() {
        let mut bytes = Vec::new();
        {
            let mut out = OutFileStream::new(Box::new(Cursor::new(&mut bytes)));
            out.write_str("hello").unwrap();
            out.write_u32(42).unwrap();
            out.flush().unwrap();
        }

        let mut input = InFileStream::new(Box::new(Cursor::new(bytes)));
        input.skip(4).unwrap();
        let mut word = [0_u8; 5];
        input.load(&mut word).unwrap();
        assert_eq!(&word, b"hello");
        assert_eq!(input.read_u32().unwrap(), 42);
        assert!(matches!(
            input.read_u8(),
            Err(SerialError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn skipping_past_the_end_fails() {
        let mut input = InFileStream::new(Box::new(Cursor::new(vec![1_u8, 2])));
        assert!(matches!(
            input.skip(5),
            Err(SerialError::UnexpectedEof { needed: 3 })
        ));
    }
}
