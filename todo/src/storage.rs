//! File-backed [`KeyValueStore`].
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a temporary sibling
//! first and are renamed into place, so an interrupted write leaves the last
//! complete value readable.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tasklist_core::environment::{KeyValueStore, StorageError};

/// Durable store over a directory
#[derive(Clone, Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if needed) the directory at `dir`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|error| StorageError::Io {
            key: dir.display().to_string(),
            message: error.to_string(),
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the values
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(StorageError::Io {
                key: key.to_string(),
                message: "key is not a valid file name".to_string(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(key: &str, error: &io::Error) -> StorageError {
    if error.kind() == io::ErrorKind::StorageFull {
        StorageError::QuotaExceeded {
            key: key.to_string(),
        }
    } else {
        StorageError::Io {
            key: key.to_string(),
            message: error.to_string(),
        }
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(io_error(key, &error)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let staging = self.dir.join(format!(".{key}.json.tmp"));

        fs::write(&staging, value).map_err(|error| io_error(key, &error))?;
        fs::rename(&staging, &path).map_err(|error| {
            let _ = fs::remove_file(&staging);
            io_error(key, &error)
        })?;

        tracing::trace!(key, bytes = value.len(), path = %path.display(), "Wrote value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(key, &error)),
        }
    }
}
