use std::io::{self, Read, Write};
use std::sync::Arc;

use super::backing::BackingStore;

/// Writer that appends into a shared store starting at an absolute offset.
///
/// Several section writers may exist over one store, but only one should
/// be written at a time.
pub struct SectionWriter {
    store: Arc<dyn BackingStore>,
    base: u64,
    written: u64,
}

impl SectionWriter {
    pub fn new(store: Arc<dyn BackingStore>, base: u64) -> Self {
        Self {
            store,
            base,
            written: 0,
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    /// Absolute position of the next write: `base + bytes written so far`.
    pub fn pos(&self) -> u64 {
        self.base + self.written
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

impl Write for SectionWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.store.write_at(self.pos(), buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.store.flush()
    }
}

impl std::fmt::Debug for SectionWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionWriter")
            .field("base", &self.base)
            .field("written", &self.written)
            .finish()
    }
}

/// Reader limited to `[base, base + len)` of a shared store.
pub struct SectionReader {
    store: Arc<dyn BackingStore>,
    base: u64,
    len: u64,
    offset: u64,
}

impl SectionReader {
    pub fn new(store: Arc<dyn BackingStore>, base: u64, len: u64) -> Self {
        Self {
            store,
            base,
            len,
            offset: 0,
        }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left before the end of the section.
    pub fn remaining(&self) -> u64 {
        self.len - self.offset
    }

    /// Start reading from the beginning of the section again.
    pub fn rewind(&mut self) {
        self.offset = 0;
    }
}

impl Read for SectionReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.offset >= self.len || buf.is_empty() {
            return Ok(0);
        }
        let n = (buf.len() as u64).min(self.remaining()) as usize;
        let got = self.store.read_at(self.base + self.offset, &mut buf[..n])?;
        self.offset += got as u64;
        Ok(got)
    }
}

impl std::fmt::Debug for SectionReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionReader")
            .field("base", &self.base)
            .field("len", &self.len)
            .field("offset", &self.offset)
            .finish()
    }
}
