//! A uniform reader/writer over an in-memory buffer or a streaming source
//! (spec §4.A). Position is always byte-aligned; bit-level bookkeeping for
//! bitfield runs lives in [`crate::types::composite::Structure`], not here.

use std::io::Read;

use crate::error::{Error, Result};

/// Absolute, forward-relative or backward-relative seek target.
#[derive(Clone, Copy, Debug)]
pub enum Seek {
    Start(usize),
    Current(i64),
}

/// A cursor over bytes, usable for both reading and writing.
///
/// Bytes already consumed from a streaming source are retained in `buf` so
/// that seeking backwards (needed e.g. to read every member of a union from
/// the same starting offset) works uniformly whether the cursor was built
/// from an in-memory slice or from an arbitrary [`Read`]r.
pub struct Cursor<'a> {
    buf: Vec<u8>,
    source: Option<Box<dyn Read + 'a>>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// A cursor over an already-materialized, fully-known buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Cursor {
            buf: bytes.into(),
            source: None,
            pos: 0,
        }
    }

    /// A cursor pulling from a streaming source on demand.
    pub fn from_reader(reader: impl Read + 'a) -> Self {
        Cursor {
            buf: Vec::new(),
            source: Some(Box::new(reader)),
            pos: 0,
        }
    }

    /// A fresh, empty cursor used to accumulate emitted bytes.
    pub fn new_writer() -> Self {
        Cursor {
            buf: Vec::new(),
            source: None,
            pos: 0,
        }
    }

    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Pulls bytes from the streaming source, if any, until `buf` holds at
    /// least `len` bytes or the source is exhausted.
    fn fill_to(&mut self, len: usize) -> std::io::Result<()> {
        if self.buf.len() >= len {
            return Ok(());
        }
        if let Some(source) = self.source.as_mut() {
            let missing = len - self.buf.len();
            let mut chunk = vec![0u8; missing];
            let mut got = 0;
            while got < missing {
                let n = source.read(&mut chunk[got..])?;
                if n == 0 {
                    chunk.truncate(got);
                    break;
                }
                got += n;
            }
            chunk.truncate(got);
            self.buf.extend_from_slice(&chunk);
        }
        Ok(())
    }

    pub fn seek(&mut self, to: Seek) -> Result<usize> {
        let target = match to {
            Seek::Start(n) => n,
            Seek::Current(delta) => {
                let cur = self.pos as i64;
                let target = cur + delta;
                if target < 0 {
                    return Err(Error::truncated("<seek>", 0, 0));
                }
                target as usize
            }
        };
        let _ = self.fill_to(target);
        if target > self.buf.len() {
            return Err(Error::truncated(
                "<seek>",
                target - self.buf.len(),
                0,
            ));
        }
        self.pos = target;
        Ok(self.pos)
    }

    /// Reads exactly `n` bytes, advancing the position. Fails with
    /// [`Error::Truncated`] on a short read.
    pub fn read_exact(&mut self, n: usize) -> Result<&[u8]> {
        let _ = self.fill_to(self.pos + n);
        let available = self.buf.len().saturating_sub(self.pos);
        if available < n {
            return Err(Error::truncated("", n, available));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Reads up to `n` bytes without failing on a short read, used by
    /// sentinel-terminated arrays that search for a terminator byte-by-byte.
    pub fn read_one(&mut self) -> Option<u8> {
        let _ = self.fill_to(self.pos + 1);
        if self.pos >= self.buf.len() {
            return None;
        }
        let b = self.buf[self.pos];
        self.pos += 1;
        Some(b)
    }

    /// Writes `bytes` at the current position, overwriting or extending the
    /// underlying buffer, and advances the position.
    pub fn write(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if self.buf.len() < end {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    /// Consumes the cursor, returning everything written/read so far.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Bytes available to read without pulling from the source, i.e. how
    /// much of the buffer is left from the current position.
    pub fn remaining_buffered(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_exact_advances_and_truncates() {
        let mut c = Cursor::from_bytes(vec![1, 2, 3, 4]);
        assert_eq!(c.read_exact(2).unwrap(), &[1, 2]);
        assert_eq!(c.tell(), 2);
        assert_eq!(c.read_exact(2).unwrap(), &[3, 4]);
        assert!(c.read_exact(1).is_err());
    }

    #[test]
    fn seek_backward_then_read_again() {
        let mut c = Cursor::from_bytes(vec![1, 2, 3, 4]);
        c.read_exact(4).unwrap();
        c.seek(Seek::Start(0)).unwrap();
        assert_eq!(c.read_exact(4).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn streaming_source_supports_backward_seek_over_consumed_bytes() {
        let data: &[u8] = &[0xde, 0xad, 0xbe, 0xef];
        let mut c = Cursor::from_reader(data);
        assert_eq!(c.read_exact(2).unwrap(), &[0xde, 0xad]);
        c.seek(Seek::Start(0)).unwrap();
        assert_eq!(c.read_exact(4).unwrap(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn write_then_into_bytes() {
        let mut c = Cursor::new_writer();
        c.write(&[1, 2, 3]);
        c.seek(Seek::Start(1)).unwrap();
        c.write(&[9]);
        assert_eq!(c.into_bytes(), vec![1, 9, 3]);
    }
}
