//! Durable medium: one JSON file per logical key inside a data directory.

use super::StorageMedium;
use crate::core::{DraftError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| DraftError::Storage(format!("Failed to create draft directory: {}", e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

impl StorageMedium for FileMedium {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DraftError::Storage(format!("Failed to read draft: {}", e))),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| DraftError::Storage(format!("Failed to create temp file: {}", e)))?;
        temp.write_all(value.as_bytes())
            .map_err(|e| DraftError::Storage(format!("Failed to write draft: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| DraftError::Storage(format!("Failed to sync draft: {}", e)))?;
        temp.persist(self.path_for(key))
            .map_err(|e| DraftError::Storage(format!("Failed to rename draft: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DraftError::Storage(format!("Failed to delete draft: {}", e))),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Keys are caller-chosen; anything outside `[A-Za-z0-9_-]` is hex-escaped so
/// a key can never address a path outside the directory.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}
