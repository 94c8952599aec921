use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`Store`](super::Store) operations.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("invalid argument: {reason}")]
  InvalidArgument { reason: &'static str },

  #[error("not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("I/O failure on {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("corrupt record {}: {source}", path.display())]
  CorruptRecord {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to encode record: {0}")]
  EncodeFailure(#[source] serde_json::Error),
}

impl StoreError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, StoreError::NotFound { .. })
  }

  pub fn is_invalid_argument(&self) -> bool {
    matches!(self, StoreError::InvalidArgument { .. })
  }

  pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    StoreError::Io {
      path: path.into(),
      source,
    }
  }

  /// Maps `ErrorKind::NotFound` to [`StoreError::NotFound`], anything else to
  /// [`StoreError::Io`].
  pub(crate) fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    let path = path.into();
    if source.kind() == io::ErrorKind::NotFound {
      StoreError::NotFound { path }
    } else {
      StoreError::Io { path, source }
    }
  }
}
