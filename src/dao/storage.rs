use std::{io, path::PathBuf};

use thiserror::Error;

/// Result alias for record store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures raised while loading or persisting the record file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The record file could not be read.
    #[error("failed to read record file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The record file could not be written or replaced.
    #[error("failed to write record file `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The record file does not contain a valid record list.
    #[error("record file `{}` is not a valid record list", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The in-memory records could not be serialized.
    #[error("failed to serialize records for `{}`", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
