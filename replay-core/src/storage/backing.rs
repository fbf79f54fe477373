use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::models::error::ReplayError;

/// Random-access byte store shared by the segment table and section readers/writers.
///
/// Implementations serialize access internally so a store can be shared
/// through `Arc<dyn BackingStore>`.
pub trait BackingStore: Send + Sync {
    /// Read into `buf` starting at `offset`. Returns fewer bytes than
    /// requested only when the end of the data is reached.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `data` at `offset`, growing the store if needed.
    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()>;

    fn len(&self) -> io::Result<u64>;

    fn flush(&self) -> io::Result<()>;
}

/// File-backed store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileStore {
    /// Open `path` for reading and writing, creating an empty file if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| ReplayError::StoreIo(format!("failed to open {}: {}", path.display(), e)))?;
        log::debug!("Opened backing store {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackingStore for FileStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn write_at(&self, offset: u64, data: &[u8]) -> io::Result<()> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.file.lock().metadata()?.len())
    }

    fn flush(&self) -> io::Result<()> {
        self.file.lock().flush()
    }
}

/// In-memory store, mostly for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data: Mutex::new(data) }
    }

    /// Copy of the current contents.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.lock().clone()
    }
}

impl BackingStore for MemoryStore {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.lock();
        let start = (offset as usize).min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write_at(&self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let mut data = self.data.lock();
        let start = offset as usize;
        let end = start + bytes.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.data.lock().len() as u64)
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_grows_and_zero_fills_gaps() {
        let store = MemoryStore::new();
        store.write_at(4, &[1, 2]).unwrap();
        assert_eq!(store.to_vec(), vec![0, 0, 0, 0, 1, 2]);

        let mut buf = [9u8; 4];
        assert_eq!(store.read_at(3, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[0, 1, 2]);
        assert_eq!(store.read_at(100, &mut buf).unwrap(), 0);
    }

    #[test]
    fn file_store_reads_back_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.bak");

        {
            let store = FileStore::open(&path).unwrap();
            assert_eq!(store.len().unwrap(), 0);
            store.write_at(48, b"audio").unwrap();
            store.write_at(0, &[7u8; 8]).unwrap();
            store.flush().unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 53);

        let mut buf = [0u8; 16];
        assert_eq!(store.read_at(48, &mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"audio");
        assert_eq!(store.read_at(0, &mut buf[..8]).unwrap(), 8);
        assert_eq!(&buf[..8], &[7u8; 8]);
    }

    #[test]
    fn file_store_open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileStore::open(dir.path().join("missing").join("take.bak")).unwrap_err();
        assert!(matches!(err, ReplayError::StoreIo(_)));
    }
}
