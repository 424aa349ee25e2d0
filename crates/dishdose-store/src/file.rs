//! File-backed implementation of `DurableStore`.
//!
//! Each key maps to one file inside the store's directory. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a crash mid-write leaves either the old value or the new one,
//! never a torn file.

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use dishdose_contracts::error::{DishDoseError, DishDoseResult};
use dishdose_core::traits::DurableStore;

/// A directory of one-value-per-file entries.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> DishDoseResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| DishDoseError::Persistence {
            reason: format!("failed to create store directory '{}': {}", dir.display(), e),
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file a key is stored in.
    ///
    /// Keys are opaque, so anything outside `[A-Za-z0-9._-]` is replaced to
    /// keep the name inside the store directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name.trim_start_matches('.')))
    }
}

impl DurableStore for FileStore {
    fn read(&self, key: &str) -> DishDoseResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DishDoseError::Persistence {
                reason: format!("failed to read '{}': {}", path.display(), e),
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> DishDoseResult<()> {
        let path = self.path_for(key);
        let fail = |e: std::io::Error| DishDoseError::Persistence {
            reason: format!("failed to write '{}': {}", path.display(), e),
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(fail)?;
        tmp.write_all(value.as_bytes()).map_err(fail)?;
        tmp.as_file().sync_all().map_err(fail)?;
        tmp.persist(&path).map_err(|e| fail(e.error))?;

        debug!(key = %key, path = %path.display(), bytes = value.len(), "file store write");
        Ok(())
    }
}
