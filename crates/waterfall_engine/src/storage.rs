use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

use crate::StorageError;

/// Byte-string key/value substrate the item list is persisted into.
///
/// Writes may fail (quota, IO); callers decide how to degrade.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage with an optional per-value byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, Vec<u8>>>,
    max_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(max_bytes: usize) -> Self {
        Self {
            values: Mutex::default(),
            max_bytes: Some(max_bytes),
        }
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        check_quota(self.max_bytes, value.len())?;
        self.values().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

/// One file per key under a data directory, written atomically.
#[derive(Debug, Clone)]
pub struct FileStorage {
    writer: AtomicFileWriter,
    max_bytes: Option<usize>,
}

impl FileStorage {
    pub fn new(dir: PathBuf, max_bytes: Option<usize>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
            max_bytes,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.writer.dir().join(file_name_for(key))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        check_quota(self.max_bytes, value.len())?;
        self.writer.write(&file_name_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

fn file_name_for(key: &str) -> String {
    format!("{key}.json")
}

fn check_quota(max_bytes: Option<usize>, needed: usize) -> Result<(), StorageError> {
    match max_bytes {
        Some(limit) if needed > limit => Err(StorageError::QuotaExceeded { needed, limit }),
        _ => Ok(()),
    }
}

/// Ensure a directory exists and is writable; create it if missing.
pub fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StorageError::Unavailable("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StorageError::Unavailable(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| StorageError::Unavailable(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        let mut pending = self.begin(filename)?;
        pending.write_chunk(content)?;
        pending.commit()
    }

    /// Open a temp file next to `{dir}/{filename}` for incremental writes.
    /// Nothing appears under the target name until `commit`; dropping the
    /// pending file removes the temp file.
    pub fn begin(&self, filename: &str) -> Result<PendingFile, StorageError> {
        ensure_dir(&self.dir)?;
        Ok(PendingFile {
            tmp: NamedTempFile::new_in(&self.dir)?,
            target: self.dir.join(filename),
            written: 0,
        })
    }
}

#[derive(Debug)]
pub struct PendingFile {
    tmp: NamedTempFile,
    target: PathBuf,
    written: usize,
}

impl PendingFile {
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len();
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn commit(mut self) -> Result<PathBuf, StorageError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        // `persist` replaces an existing target in one rename.
        self.tmp
            .persist(&self.target)
            .map_err(|e| StorageError::Io(e.error))?;
        Ok(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_file_appears_only_on_commit() {
        let temp = tempfile::TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path().to_path_buf());

        let mut pending = writer.begin("clip.mp4").unwrap();
        pending.write_chunk(b"abc").unwrap();
        pending.write_chunk(b"def").unwrap();
        assert_eq!(pending.written(), 6);
        assert!(!temp.path().join("clip.mp4").exists());

        let path = pending.commit().unwrap();
        assert_eq!(fs::read(path).unwrap(), b"abcdef");
    }

    #[test]
    fn dropped_pending_file_leaves_nothing() {
        let temp = tempfile::TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path().to_path_buf());

        let mut pending = writer.begin("partial.mp4").unwrap();
        pending.write_chunk(b"half").unwrap();
        drop(pending);

        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
