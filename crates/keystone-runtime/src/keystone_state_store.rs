//! Persistent blob stores for keystone plugin state.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use chrono::Utc;

/// Trait contract for `KeystoneStateStore` behavior.
pub trait KeystoneStateStore: Send + Sync {
    /// Returns the stored blob, or `None` when nothing has been saved yet.
    fn load_blob(&self) -> Result<Option<Vec<u8>>>;

    fn save_blob(&self, payload: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Stores the state blob in a single file, replaced atomically on save.
pub struct FileKeystoneStateStore {
    path: PathBuf,
}

impl FileKeystoneStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeystoneStateStore for FileKeystoneStateStore {
    fn load_blob(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error)
                .with_context(|| format!("failed to read keystone state {}", self.path.display())),
        }
    }

    fn save_blob(&self, payload: &[u8]) -> Result<()> {
        write_bytes_atomic(&self.path, payload)
            .with_context(|| format!("failed to write keystone state {}", self.path.display()))
    }
}

#[derive(Debug, Default)]
/// In-process store, used where no file should be touched.
pub struct MemoryKeystoneStateStore {
    blob: Mutex<Option<Vec<u8>>>,
}

impl MemoryKeystoneStateStore {
    pub fn with_blob(payload: Vec<u8>) -> Self {
        Self {
            blob: Mutex::new(Some(payload)),
        }
    }

    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KeystoneStateStore for MemoryKeystoneStateStore {
    fn load_blob(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot())
    }

    fn save_blob(&self, payload: &[u8]) -> Result<()> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload.to_vec());
        Ok(())
    }
}

/// Writes bytes through a temp file + rename so readers never observe a
/// partial state file.
fn write_bytes_atomic(path: &Path, payload: &[u8]) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("state path cannot be empty");
    }
    if path.is_dir() {
        bail!("state path '{}' is a directory", path.display());
    }

    let parent_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent_dir)
        .with_context(|| format!("failed to create {}", parent_dir.display()))?;

    let temp_path = parent_dir.join(format!(
        ".{}.tmp-{}-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("keystone-state"),
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    std::fs::write(&temp_path, payload)
        .with_context(|| format!("failed to write temporary file {}", temp_path.display()))?;
    std::fs::rename(&temp_path, path).with_context(|| {
        format!(
            "failed to rename temporary state file {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;
    Ok(())
}
