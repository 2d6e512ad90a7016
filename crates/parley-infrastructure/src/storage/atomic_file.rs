//! Atomic file operations for JSON and TOML documents.
//!
//! Provides a thin layer for safe access to small state and config files.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Errors that can occur during atomic file operations.
#[derive(Debug)]
pub enum AtomicFileError {
    /// File I/O error.
    IoError(std::io::Error),
    /// JSON serialization/deserialization error.
    JsonError(serde_json::Error),
    /// TOML deserialization error.
    TomlError(toml::de::Error),
    /// TOML serialization error.
    TomlSerError(toml::ser::Error),
    /// File locking error.
    LockError(String),
}

impl std::fmt::Display for AtomicFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtomicFileError::IoError(e) => write!(f, "I/O error: {}", e),
            AtomicFileError::JsonError(e) => write!(f, "JSON error: {}", e),
            AtomicFileError::TomlError(e) => write!(f, "TOML parse error: {}", e),
            AtomicFileError::TomlSerError(e) => write!(f, "TOML serialization error: {}", e),
            AtomicFileError::LockError(e) => write!(f, "Lock error: {}", e),
        }
    }
}

impl std::error::Error for AtomicFileError {}

impl From<std::io::Error> for AtomicFileError {
    fn from(e: std::io::Error) -> Self {
        AtomicFileError::IoError(e)
    }
}

impl From<serde_json::Error> for AtomicFileError {
    fn from(e: serde_json::Error) -> Self {
        AtomicFileError::JsonError(e)
    }
}

impl From<toml::de::Error> for AtomicFileError {
    fn from(e: toml::de::Error) -> Self {
        AtomicFileError::TomlError(e)
    }
}

impl From<toml::ser::Error> for AtomicFileError {
    fn from(e: toml::ser::Error) -> Self {
        AtomicFileError::TomlSerError(e)
    }
}

impl From<AtomicFileError> for parley_core::ParleyError {
    fn from(e: AtomicFileError) -> Self {
        match e {
            AtomicFileError::IoError(io) => io.into(),
            AtomicFileError::JsonError(json) => json.into(),
            AtomicFileError::TomlError(de) => de.into(),
            AtomicFileError::TomlSerError(ser) => ser.into(),
            AtomicFileError::LockError(msg) => parley_core::ParleyError::storage(msg),
        }
    }
}

/// On-disk encoding of an [`AtomicFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    fn encode<T: Serialize>(self, data: &T) -> Result<String, AtomicFileError> {
        Ok(match self {
            FileFormat::Json => serde_json::to_string_pretty(data)?,
            FileFormat::Toml => toml::to_string_pretty(data)?,
        })
    }

    fn decode<T: DeserializeOwned>(self, content: &str) -> Result<T, AtomicFileError> {
        Ok(match self {
            FileFormat::Json => serde_json::from_str(content)?,
            FileFormat::Toml => toml::from_str(content)?,
        })
    }
}

/// A handle to a document file whose writes are all-or-nothing.
///
/// - **Atomicity**: Updates go through a tmp file + atomic rename
/// - **Isolation**: An advisory lock file serializes writers across processes
/// - **Durability**: Explicit fsync before rename
pub struct AtomicFile<T> {
    path: PathBuf,
    format: FileFormat,
    _phantom: PhantomData<T>,
}

impl<T> AtomicFile<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Creates a new atomic file handle.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the file
    /// * `format` - How the document is encoded
    pub fn new(path: PathBuf, format: FileFormat) -> Self {
        Self {
            path,
            format,
            _phantom: PhantomData,
        }
    }

    pub fn json(path: PathBuf) -> Self {
        Self::new(path, FileFormat::Json)
    }

    pub fn toml(path: PathBuf) -> Self {
        Self::new(path, FileFormat::Toml)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file and deserializes it.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicFileError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = self.format.decode(&content)?;
        Ok(Some(data))
    }

    /// Saves data to the file atomically while holding the writer lock.
    pub fn save(&self, data: &T) -> Result<(), AtomicFileError> {
        let _lock = self.acquire_lock()?;
        self.write_unlocked(data)
    }

    /// Loads the document, or writes and returns `default_value` if there is none.
    pub fn load_or_create(&self, default_value: T) -> Result<T, AtomicFileError> {
        let _lock = self.acquire_lock()?;
        match self.load()? {
            Some(data) => Ok(data),
            None => {
                self.write_unlocked(&default_value)?;
                Ok(default_value)
            }
        }
    }

    fn write_unlocked(&self, data: &T) -> Result<(), AtomicFileError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let encoded = self.format.encode(data)?;

        // Write to temporary file in the same directory
        let tmp_path = self.get_temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(encoded.as_bytes())?;

        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Gets a temporary file path for atomic writes.
    fn get_temp_path(&self) -> Result<PathBuf, AtomicFileError> {
        let parent = self.path.parent().ok_or_else(|| {
            AtomicFileError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no parent directory",
            ))
        })?;

        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicFileError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;

        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(parent.join(tmp_name))
    }

    fn acquire_lock(&self) -> Result<FileLock, AtomicFileError> {
        FileLock::acquire(&self.path)
    }
}

/// Holds the advisory lock until dropped.
///
/// The `.lock` file itself is never removed: a waiter blocked on the old
/// handle would otherwise lock an unlinked inode while a new writer locks a
/// fresh one.
struct FileLock {
    _file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicFileError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| AtomicFileError::LockError(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { _file: file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestDoc {
        name: String,
        count: u32,
    }

    fn doc() -> TestDoc {
        TestDoc {
            name: "test".to_string(),
            count: 42,
        }
    }

    #[test]
    fn test_json_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<TestDoc>::json(temp_dir.path().join("state.json"));

        file.save(&doc()).unwrap();

        assert_eq!(file.load().unwrap(), Some(doc()));
    }

    #[test]
    fn test_toml_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<TestDoc>::toml(temp_dir.path().join("config.toml"));

        file.save(&doc()).unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("name = \"test\""));
        assert_eq!(file.load().unwrap(), Some(doc()));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<TestDoc>::json(temp_dir.path().join("missing.json"));

        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");
        fs::write(&path, "  \n").unwrap();

        let file = AtomicFile::<TestDoc>::json(path);
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("corrupt.json");
        fs::write(&path, "{not json").unwrap();

        let file = AtomicFile::<TestDoc>::json(path);
        assert!(matches!(file.load(), Err(AtomicFileError::JsonError(_))));
    }

    #[test]
    fn test_load_or_create_writes_default_once() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<TestDoc>::toml(temp_dir.path().join("nested/config.toml"));

        let created = file.load_or_create(doc()).unwrap();
        assert_eq!(created, doc());
        assert!(file.path().exists());

        let other = TestDoc {
            name: "other".to_string(),
            count: 1,
        };
        assert_eq!(file.load_or_create(other).unwrap(), doc());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file_and_keeps_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("state.json");
        let file = AtomicFile::<TestDoc>::json(file_path.clone());

        file.save(&doc()).unwrap();

        assert!(!temp_dir.path().join(".state.json.tmp").exists());
        assert!(temp_dir.path().join("state.lock").exists());
        assert!(file_path.exists());
    }

    #[test]
    fn test_lock_is_released_between_writes() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::<TestDoc>::json(temp_dir.path().join("state.json"));
        let lock_path = temp_dir.path().join("state.lock");

        file.save(&doc()).unwrap();
        let inode_before = fs::metadata(&lock_path).unwrap();

        let updated = TestDoc {
            name: "updated".to_string(),
            count: 7,
        };
        file.save(&updated).unwrap();

        assert_eq!(file.load().unwrap(), Some(updated));
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            let inode_after = fs::metadata(&lock_path).unwrap();
            assert_eq!(inode_before.ino(), inode_after.ino());
        }
        #[cfg(not(unix))]
        let _ = inode_before;
    }
}
