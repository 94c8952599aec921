//! Maps (collection, resource) pairs onto the on-disk layout.
//!
//! ```text
//! <root>/
//! └── <collection>/
//!     ├── <resource>.<ext>        # committed record
//!     └── <resource>.<ext>.tmp    # staged record, present only mid-write
//! ```
//!
//! Resolution is pure: nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use crate::consts::TEMP_SUFFIX;

use super::StoreError;

/// Paths involved in reading or writing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaths {
  pub collection_dir: PathBuf,
  pub record: PathBuf,
  pub temp: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Layout {
  root: PathBuf,
  extension: String,
}

impl Layout {
  pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      extension: extension.into(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn extension(&self) -> &str {
    &self.extension
  }

  pub fn collection_dir(&self, collection: &str) -> Result<PathBuf, StoreError> {
    validate_name(collection, "missing collection name")?;
    Ok(self.root.join(collection))
  }

  pub fn resolve(&self, collection: &str, resource: &str) -> Result<RecordPaths, StoreError> {
    let collection_dir = self.collection_dir(collection)?;
    validate_name(resource, "missing resource name")?;

    let record = collection_dir.join(format!("{}.{}", resource, self.extension));
    let mut temp = record.clone().into_os_string();
    temp.push(TEMP_SUFFIX);

    Ok(RecordPaths {
      collection_dir,
      record,
      temp: PathBuf::from(temp),
    })
  }

  /// Returns the resource name for a file inside a collection directory, or
  /// `None` if the file is not a committed record.
  pub fn resource_name(&self, file: &Path) -> Option<String> {
    let name = file.file_name()?.to_str()?;
    let stem = name.strip_suffix(&self.extension)?.strip_suffix('.')?;
    if stem.is_empty() {
      return None;
    }
    Some(stem.to_string())
  }
}

fn validate_name(name: &str, missing: &'static str) -> Result<(), StoreError> {
  if name.is_empty() {
    return Err(StoreError::InvalidArgument { reason: missing });
  }

  // Names map to a single path component under the root.
  if name == "." || name == ".." || name.contains(['/', '\\']) {
    return Err(StoreError::InvalidArgument {
      reason: "name must be a single path component",
    });
  }

  Ok(())
}

/// Record extensions become the final suffix of a single file name.
pub(crate) fn validate_extension(extension: &str) -> Result<(), StoreError> {
  if extension.is_empty() {
    return Err(StoreError::InvalidArgument {
      reason: "missing record extension",
    });
  }

  if extension.starts_with('.') || extension.contains(['/', '\\']) || extension.ends_with(TEMP_SUFFIX) {
    return Err(StoreError::InvalidArgument {
      reason: "record extension must be a plain file suffix",
    });
  }

  Ok(())
}
