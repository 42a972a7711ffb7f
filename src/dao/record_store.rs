//! JSON file holding the authoritative record list.
//!
//! Access is scoped: [`RecordStore::open`] loads the whole document into a
//! [`StoreHandle`], and a writable handle puts the (possibly mutated) list back
//! on disk when it is closed or dropped, whichever comes first.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::{debug, error};

use super::{
    models::Record,
    storage::{StorageError, StorageResult},
};

/// Whether a handle writes its records back when released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Location of the record file and entry point for scoped access to it.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: Arc<PathBuf>,
}

impl RecordStore {
    /// Point the store at `path`. The file is created on the first write if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record list and hand it out for the lifetime of the returned handle.
    pub async fn open(&self, mode: AccessMode) -> StorageResult<StoreHandle> {
        let records = match tokio::fs::read(self.path.as_path()).await {
            Ok(bytes) => decode(&self.path, &bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "record file missing; starting empty");
                Vec::new()
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.to_path_buf(),
                    source,
                });
            }
        };

        Ok(StoreHandle {
            path: self.path.clone(),
            mode,
            records,
            released: false,
        })
    }

    /// Snapshot of the current records. Never writes back.
    pub async fn read(&self) -> StorageResult<Vec<Record>> {
        let handle = self.open(AccessMode::ReadOnly).await?;
        Ok(handle.into_records())
    }

    /// Run `work` against a writable handle and persist the list afterwards,
    /// whether `work` succeeded or not.
    ///
    /// An error from `work` takes precedence over a failure to persist.
    pub async fn modify<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Vec<Record>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let mut handle = self.open(AccessMode::ReadWrite).await?;
        let outcome = work(handle.records_mut());
        let closed = handle.close().await;

        match (outcome, closed) {
            (Err(err), Err(close_err)) => {
                error!(error = %close_err, "failed to persist records after a failed edit");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    /// Raw bytes of the backing file, as persisted.
    pub async fn raw_contents(&self) -> StorageResult<Vec<u8>> {
        match tokio::fs::read(self.path.as_path()).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => encode(&self.path, &[]),
            Err(source) => Err(StorageError::Read {
                path: self.path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Loaded record list tied to one access scope.
#[derive(Debug)]
pub struct StoreHandle {
    path: Arc<PathBuf>,
    mode: AccessMode,
    records: Vec<Record>,
    released: bool,
}

impl StoreHandle {
    /// Access mode the handle was opened with.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Records as loaded (plus any changes made through this handle).
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Mutable access. Changes only reach the disk for [`AccessMode::ReadWrite`] handles.
    pub fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    /// Release the handle, writing the records back if it is writable.
    pub async fn close(mut self) -> StorageResult<()> {
        self.released = true;
        if self.mode == AccessMode::ReadOnly {
            return Ok(());
        }

        let bytes = encode(&self.path, &self.records)?;
        let temp = temp_path(&self.path);
        tokio::fs::write(&temp, &bytes)
            .await
            .map_err(|source| write_error(&self.path, source))?;
        tokio::fs::rename(&temp, self.path.as_path())
            .await
            .map_err(|source| write_error(&self.path, source))?;

        debug!(path = %self.path.display(), count = self.records.len(), "records persisted");
        Ok(())
    }

    fn into_records(mut self) -> Vec<Record> {
        self.released = true;
        std::mem::take(&mut self.records)
    }

    fn persist_blocking(&self) -> StorageResult<()> {
        let bytes = encode(&self.path, &self.records)?;
        let temp = temp_path(&self.path);
        fs::write(&temp, &bytes).map_err(|source| write_error(&self.path, source))?;
        fs::rename(&temp, self.path.as_path()).map_err(|source| write_error(&self.path, source))
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        if self.released || self.mode == AccessMode::ReadOnly {
            return;
        }
        if let Err(err) = self.persist_blocking() {
            error!(error = %err, "failed to persist records while releasing store handle");
        }
    }
}

fn decode(path: &Path, bytes: &[u8]) -> StorageResult<Vec<Record>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn encode(path: &Path, records: &[Record]) -> StorageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    records
        .serialize(&mut serializer)
        .map_err(|source| StorageError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(buffer)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_error(path: &Path, source: io::Error) -> StorageError {
    StorageError::Write {
        path: path.to_path_buf(),
        source,
    }
}
