//! Embedded, file-based document store.
//!
//! Records are grouped into collections. Each collection is a directory under
//! the store root and each record is one JSON file inside it.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── installs/
//! │   ├── blender-4.1.json
//! │   └── blender-4.2.json
//! └── preferences/
//!     └── settings.json
//! ```
//!
//! Writes stage the encoded record in `<resource>.json.tmp` and rename it over
//! the final file, so readers only ever see complete records. Writes and
//! deletes within a collection are serialized by a per-collection lock; reads
//! take no lock.

mod codec;
mod collection;
mod error;
mod lock;
pub mod paths;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::consts::{RECORD_EXTENSION, TEMP_SUFFIX};

pub use codec::{decode, encode};
pub use collection::Collection;
pub use error::StoreError;
pub use lock::LockRegistry;
use paths::{Layout, RecordPaths};

pub type Result<T> = std::result::Result<T, StoreError>;

/// A record returned by [`Store::read_all`], decoded without a target type.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
  pub resource: String,
  pub path: PathBuf,
  pub value: Value,
}

impl RawRecord {
  pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
    T::deserialize(&self.value).map_err(|source| StoreError::CorruptRecord {
      path: self.path.clone(),
      source,
    })
  }
}

/// Summary of one collection directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
  pub name: String,
  pub records: usize,
  pub bytes: u64,
  pub modified_unix: Option<u64>,
}

#[derive(Debug)]
pub struct Store {
  layout: Layout,
  locks: LockRegistry,
}

impl Store {
  /// Open the store at `root`, creating the directory if it does not exist.
  pub fn open(root: impl AsRef<Path>) -> Result<Self> {
    Self::with_extension(root, RECORD_EXTENSION)
  }

  /// Open the store with a record extension other than `json`.
  ///
  /// The extension must be a non-empty file name suffix without separators
  /// or a leading dot.
  pub fn with_extension(root: impl AsRef<Path>, extension: &str) -> Result<Self> {
    let root = root.as_ref();
    paths::validate_extension(extension)?;

    if root.is_dir() {
      debug!(root = ?root, "using existing database");
    } else {
      fs::create_dir_all(root).map_err(|e| StoreError::io(root, e))?;
      info!(root = ?root, "created database");
    }

    let root = dunce::canonicalize(root).map_err(|e| StoreError::io(root, e))?;

    Ok(Self {
      layout: Layout::new(root, extension),
      locks: LockRegistry::new(),
    })
  }

  pub fn root(&self) -> &Path {
    self.layout.root()
  }

  pub fn extension(&self) -> &str {
    self.layout.extension()
  }

  /// Paths a record would occupy. Performs no I/O.
  pub fn resolve(&self, collection: &str, resource: &str) -> Result<RecordPaths> {
    self.layout.resolve(collection, resource)
  }

  /// Typed view over one collection.
  pub fn collection<T>(&self, name: &str) -> Collection<'_, T> {
    Collection::new(self, name)
  }

  /// Write `value` as `resource` in `collection`, replacing any previous record.
  pub fn write<T: Serialize + ?Sized>(&self, collection: &str, resource: &str, value: &T) -> Result<()> {
    let paths = self.layout.resolve(collection, resource)?;

    let lock = self.locks.lock_for(collection);
    let _guard = lock::acquire(&lock);

    self.commit(&paths, value)
  }

  /// Read `resource` from `collection`.
  pub fn read<T: DeserializeOwned>(&self, collection: &str, resource: &str) -> Result<T> {
    let paths = self.layout.resolve(collection, resource)?;
    read_record(&paths.record)
  }

  pub fn exists(&self, collection: &str, resource: &str) -> Result<bool> {
    let paths = self.layout.resolve(collection, resource)?;
    Ok(paths.record.is_file())
  }

  /// Read every record in `collection`, in directory listing order.
  ///
  /// Staged `.tmp` files and files without the store extension are skipped.
  /// The first record that fails to read or decode aborts the call.
  pub fn read_all(&self, collection: &str) -> Result<Vec<RawRecord>> {
    let dir = self.layout.collection_dir(collection)?;
    let entries = fs::read_dir(&dir).map_err(|e| StoreError::from_io(&dir, e))?;

    let mut records = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
      let path = entry.path();

      let file_type = entry.file_type().map_err(|e| StoreError::io(&path, e))?;
      if !file_type.is_file() {
        continue;
      }

      let Some(resource) = self.layout.resource_name(&path) else {
        continue;
      };

      let value = read_record(&path)?;
      records.push(RawRecord { resource, path, value });
    }

    debug!(collection = %collection, count = records.len(), "read collection");
    Ok(records)
  }

  /// Read-modify-write `resource` while holding the collection lock.
  ///
  /// `f` receives the current record, or `None` if there is none yet, and
  /// returns the record to store.
  pub fn update<T, F>(&self, collection: &str, resource: &str, f: F) -> Result<T>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce(Option<T>) -> T,
  {
    let paths = self.layout.resolve(collection, resource)?;

    let lock = self.locks.lock_for(collection);
    let _guard = lock::acquire(&lock);

    let current = match read_record(&paths.record) {
      Ok(value) => Some(value),
      Err(e) if e.is_not_found() => None,
      Err(e) => return Err(e),
    };

    let next = f(current);
    self.commit(&paths, &next)?;
    Ok(next)
  }

  /// Delete `resource` from `collection`.
  ///
  /// An empty `resource` deletes the whole collection, as
  /// [`Store::delete_collection`] does. Callers deleting a single record by a
  /// name they did not choose themselves should use [`Store::delete_record`].
  pub fn delete(&self, collection: &str, resource: &str) -> Result<()> {
    if resource.is_empty() {
      return self.delete_collection(collection);
    }

    self.delete_record(collection, resource)
  }

  /// Delete exactly one record. An empty `resource` is `InvalidArgument`.
  pub fn delete_record(&self, collection: &str, resource: &str) -> Result<()> {
    let paths = self.layout.resolve(collection, resource)?;

    let lock = self.locks.lock_for(collection);
    let _guard = lock::acquire(&lock);

    fs::remove_file(&paths.record).map_err(|e| StoreError::from_io(&paths.record, e))?;
    debug!(collection = %collection, resource = %resource, "deleted record");
    Ok(())
  }

  /// Delete `collection` and every record in it.
  pub fn delete_collection(&self, collection: &str) -> Result<()> {
    let dir = self.layout.collection_dir(collection)?;

    let lock = self.locks.lock_for(collection);
    let _guard = lock::acquire(&lock);

    if !dir.is_dir() {
      return Err(StoreError::NotFound { path: dir });
    }

    fs::remove_dir_all(&dir).map_err(|e| StoreError::from_io(&dir, e))?;
    info!(collection = %collection, "deleted collection");
    Ok(())
  }

  /// List the collections under the root, sorted by name.
  pub fn collections(&self) -> Result<Vec<CollectionInfo>> {
    let root = self.root();
    let entries = fs::read_dir(root).map_err(|e| StoreError::io(root, e))?;

    let mut collections = Vec::new();
    for entry in entries {
      let entry = entry.map_err(|e| StoreError::io(root, e))?;
      let path = entry.path();
      if !path.is_dir() {
        continue;
      }
      let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        continue;
      };

      let mut info = CollectionInfo {
        name: name.to_string(),
        records: 0,
        bytes: 0,
        modified_unix: None,
      };

      let files = fs::read_dir(&path).map_err(|e| StoreError::io(&path, e))?;
      for file in files {
        let file = file.map_err(|e| StoreError::io(&path, e))?;
        if self.layout.resource_name(&file.path()).is_none() {
          continue;
        }

        let metadata = file.metadata().map_err(|e| StoreError::io(file.path(), e))?;
        if !metadata.is_file() {
          continue;
        }

        info.records += 1;
        info.bytes += metadata.len();

        let modified = metadata
          .modified()
          .ok()
          .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
          .map(|d| d.as_secs());
        info.modified_unix = info.modified_unix.max(modified);
      }

      collections.push(info);
    }

    collections.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(collections)
  }

  /// Remove staged `.tmp` files left behind by interrupted writes.
  ///
  /// Each file is removed while holding its collection's lock, so a write in
  /// progress never loses its staged record.
  pub fn prune_temp_files(&self) -> Result<Vec<PathBuf>> {
    let root = self.root().to_path_buf();

    let mut candidates = Vec::new();
    for entry in WalkDir::new(&root).min_depth(2).max_depth(2).sort_by_file_name() {
      let entry = entry.map_err(|e| {
        let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
        StoreError::io(path, io::Error::other(e))
      })?;

      if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(TEMP_SUFFIX) {
        candidates.push(entry.into_path());
      }
    }

    let mut removed = Vec::new();
    for path in candidates {
      let Some(collection) = path
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
        .map(str::to_string)
      else {
        continue;
      };

      let lock = self.locks.lock_for(&collection);
      let _guard = lock::acquire(&lock);

      match fs::remove_file(&path) {
        Ok(()) => {
          debug!(path = ?path, "removed stale temp file");
          removed.push(path);
        }
        // Renamed into place by a write that finished after the scan.
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(StoreError::io(path, e)),
      }
    }

    if !removed.is_empty() {
      info!(count = removed.len(), "pruned stale temp files");
    }
    Ok(removed)
  }

  /// Number of collections that have been locked at least once.
  pub fn lock_count(&self) -> usize {
    self.locks.len()
  }

  /// Encode and atomically install a record. Caller holds the collection lock.
  fn commit<T: Serialize + ?Sized>(&self, paths: &RecordPaths, value: &T) -> Result<()> {
    let bytes = encode(value)?;

    fs::create_dir_all(&paths.collection_dir).map_err(|e| StoreError::io(&paths.collection_dir, e))?;

    if let Err(e) = write_synced(&paths.temp, &bytes) {
      discard_temp(&paths.temp);
      return Err(StoreError::io(&paths.temp, e));
    }

    if let Err(e) = fs::rename(&paths.temp, &paths.record) {
      discard_temp(&paths.temp);
      return Err(StoreError::io(&paths.record, e));
    }

    debug!(path = ?paths.record, bytes = bytes.len(), "wrote record");
    Ok(())
  }
}

fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let bytes = fs::read(path).map_err(|e| StoreError::from_io(path, e))?;
  decode(&bytes).map_err(|source| StoreError::CorruptRecord {
    path: path.to_path_buf(),
    source,
  })
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
  let mut file = File::create(path)?;
  file.write_all(bytes)?;
  file.sync_all()
}

fn discard_temp(path: &Path) {
  if let Err(e) = fs::remove_file(path)
    && e.kind() != io::ErrorKind::NotFound
  {
    warn!(path = ?path, error = %e, "failed to remove temp file, continuing");
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::Deserialize;
  use serde_json::json;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  #[serde(rename_all = "PascalCase")]
  struct Install {
    path: String,
    version: String,
    hash: String,
  }

  fn blender_41() -> Install {
    Install {
      path: "/opt/b41".to_string(),
      version: "4.1.0".to_string(),
      hash: "abc123".to_string(),
    }
  }

  fn test_store() -> (Store, TempDir) {
    let temp = TempDir::new().unwrap();
    let store = Store::open(temp.path().join("db")).unwrap();
    (store, temp)
  }

  #[test]
  fn open_creates_missing_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("nested").join("db");
    let store = Store::open(&root).unwrap();
    assert!(root.is_dir());
    assert_eq!(store.root(), dunce::canonicalize(&root).unwrap());
  }

  #[test]
  fn open_reuses_existing_root() {
    let (store, _temp) = test_store();
    store.write("installs", "blender-4.1", &blender_41()).unwrap();

    let reopened = Store::open(store.root()).unwrap();
    let out: Install = reopened.read("installs", "blender-4.1").unwrap();
    assert_eq!(out, blender_41());
  }

  #[test]
  fn write_then_read_returns_same_record() {
    let (store, _temp) = test_store();
    store.write("installs", "blender-4.1", &blender_41()).unwrap();

    let out: Install = store.read("installs", "blender-4.1").unwrap();
    assert_eq!(out, blender_41());
  }

  #[test]
  fn write_produces_canonical_file() {
    let (store, _temp) = test_store();
    store.write("installs", "blender-4.1", &blender_41()).unwrap();

    let paths = store.resolve("installs", "blender-4.1").unwrap();
    let content = fs::read_to_string(&paths.record).unwrap();
    assert_eq!(
      content,
      "{\n\t\"Hash\": \"abc123\",\n\t\"Path\": \"/opt/b41\",\n\t\"Version\": \"4.1.0\"\n}\n"
    );
    assert!(!paths.temp.exists());
  }

  #[test]
  fn write_replaces_previous_record() {
    let (store, _temp) = test_store();
    store.write("installs", "blender", &json!({ "version": "4.1.0" })).unwrap();
    store.write("installs", "blender", &json!({ "version": "4.2.0" })).unwrap();

    let out: Value = store.read("installs", "blender").unwrap();
    assert_eq!(out, json!({ "version": "4.2.0" }));
  }

  #[test]
  fn custom_extension_is_applied() {
    let temp = TempDir::new().unwrap();
    let store = Store::with_extension(temp.path(), "rec").unwrap();
    store.write("installs", "blender", &json!(1)).unwrap();
    assert!(store.root().join("installs").join("blender.rec").is_file());
  }

  #[test]
  fn malformed_extensions_are_rejected() {
    let temp = TempDir::new().unwrap();
    for extension in ["", ".json", "a/b", "a\\b", "json.tmp"] {
      let err = Store::with_extension(temp.path().join("db"), extension).unwrap_err();
      assert!(err.is_invalid_argument(), "accepted extension {extension:?}");
    }
    assert!(!temp.path().join("db").exists());
  }

  #[test]
  fn empty_names_are_rejected_without_touching_disk() {
    let (store, _temp) = test_store();

    assert!(store.write("", "x", &json!(1)).unwrap_err().is_invalid_argument());
    assert!(store.write("c", "", &json!(1)).unwrap_err().is_invalid_argument());
    assert!(store.read::<Value>("", "x").unwrap_err().is_invalid_argument());
    assert!(store.read::<Value>("c", "").unwrap_err().is_invalid_argument());
    assert!(store.read_all("").unwrap_err().is_invalid_argument());
    assert!(store.delete("", "x").unwrap_err().is_invalid_argument());
    assert!(store.delete("", "").unwrap_err().is_invalid_argument());

    assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
    assert_eq!(store.lock_count(), 0);
  }

  #[test]
  fn read_missing_resource_is_not_found() {
    let (store, _temp) = test_store();
    assert!(store.read::<Install>("installs", "blender-4.1").unwrap_err().is_not_found());

    store.write("installs", "other", &blender_41()).unwrap();
    assert!(store.read::<Install>("installs", "blender-4.1").unwrap_err().is_not_found());
  }

  #[test]
  fn read_all_missing_collection_is_not_found() {
    let (store, _temp) = test_store();
    assert!(store.read_all("installs").unwrap_err().is_not_found());
  }

  #[test]
  fn read_corrupt_record_fails() {
    let (store, _temp) = test_store();
    let paths = store.resolve("installs", "broken").unwrap();
    fs::create_dir_all(&paths.collection_dir).unwrap();
    fs::write(&paths.record, "{\"Path\": ").unwrap();

    let err = store.read::<Install>("installs", "broken").unwrap_err();
    assert!(matches!(err, StoreError::CorruptRecord { .. }));
    assert!(matches!(store.read_all("installs").unwrap_err(), StoreError::CorruptRecord { .. }));
  }

  #[test]
  fn read_with_wrong_shape_is_corrupt() {
    let (store, _temp) = test_store();
    store.write("installs", "blender", &json!({ "Path": 1 })).unwrap();

    let err = store.read::<Install>("installs", "blender").unwrap_err();
    assert!(matches!(err, StoreError::CorruptRecord { .. }));
  }

  #[test]
  fn encode_failure_leaves_previous_record() {
    use std::collections::HashMap;

    let (store, _temp) = test_store();
    store.write("installs", "blender", &json!({ "ok": true })).unwrap();

    let mut bad = HashMap::new();
    bad.insert((1, 2), "tuple keys are not encodable");
    let err = store.write("installs", "blender", &bad).unwrap_err();
    assert!(matches!(err, StoreError::EncodeFailure(_)));

    let out: Value = store.read("installs", "blender").unwrap();
    assert_eq!(out, json!({ "ok": true }));
  }

  #[test]
  fn read_all_returns_every_record() {
    let (store, _temp) = test_store();
    let blender_42 = Install {
      path: "/opt/b42".to_string(),
      version: "4.2.0".to_string(),
      hash: "def456".to_string(),
    };
    store.write("installs", "blender-4.1", &blender_41()).unwrap();
    store.write("installs", "blender-4.2", &blender_42).unwrap();

    let mut records = store.read_all("installs").unwrap();
    assert_eq!(records.len(), 2);

    records.sort_by(|a, b| a.resource.cmp(&b.resource));
    assert_eq!(records[0].resource, "blender-4.1");
    assert_eq!(records[0].decode::<Install>().unwrap(), blender_41());
    assert_eq!(records[1].decode::<Install>().unwrap(), blender_42);
  }

  #[test]
  fn read_all_skips_temp_and_foreign_entries() {
    let (store, _temp) = test_store();
    store.write("installs", "blender-4.1", &blender_41()).unwrap();

    let dir = store.root().join("installs");
    fs::write(dir.join("blender-4.2.json.tmp"), "{\"Path\": ").unwrap();
    fs::write(dir.join("README.txt"), "not a record").unwrap();
    fs::create_dir(dir.join("nested.json")).unwrap();

    let records = store.read_all("installs").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].resource, "blender-4.1");
  }

  #[test]
  fn read_all_empty_collection_is_empty() {
    let (store, _temp) = test_store();
    store.write("installs", "blender", &json!(1)).unwrap();
    store.delete("installs", "blender").unwrap();

    assert!(store.read_all("installs").unwrap().is_empty());
  }

  #[test]
  fn delete_removes_single_record() {
    let (store, _temp) = test_store();
    store.write("installs", "a", &json!(1)).unwrap();
    store.write("installs", "b", &json!(2)).unwrap();

    store.delete("installs", "a").unwrap();
    assert!(!store.exists("installs", "a").unwrap());
    assert!(store.exists("installs", "b").unwrap());
  }

  #[test]
  fn delete_missing_targets_is_not_found() {
    let (store, _temp) = test_store();
    assert!(store.delete("installs", "a").unwrap_err().is_not_found());
    assert!(store.delete("installs", "").unwrap_err().is_not_found());
    assert!(store.delete_collection("installs").unwrap_err().is_not_found());
  }

  #[test]
  fn delete_record_never_removes_the_collection() {
    let (store, _temp) = test_store();
    store.write("installs", "a", &json!(1)).unwrap();
    store.write("installs", "b", &json!(2)).unwrap();

    assert!(store.delete_record("installs", "").unwrap_err().is_invalid_argument());
    assert!(store.delete_record("", "a").unwrap_err().is_invalid_argument());
    assert_eq!(store.read_all("installs").unwrap().len(), 2);

    store.delete_record("installs", "a").unwrap();
    assert!(store.delete_record("installs", "a").unwrap_err().is_not_found());
    assert_eq!(store.read_all("installs").unwrap().len(), 1);
  }

  #[test]
  fn delete_with_empty_resource_removes_collection() {
    let (store, _temp) = test_store();
    store.write("installs", "blender-4.1", &blender_41()).unwrap();
    store.write("installs", "blender-4.2", &blender_41()).unwrap();
    store.write("remotes", "official", &json!({ "url": "https://example.com" })).unwrap();

    store.delete("installs", "").unwrap();

    assert!(!store.root().join("installs").exists());
    assert!(store.read_all("installs").unwrap_err().is_not_found());
    assert_eq!(store.read_all("remotes").unwrap().len(), 1);
  }

  #[test]
  fn update_starts_from_none_and_accumulates() {
    let (store, _temp) = test_store();

    let first: Vec<String> = store
      .update("log", "entries", |current: Option<Vec<String>>| {
        assert!(current.is_none());
        vec!["one".to_string()]
      })
      .unwrap();
    assert_eq!(first, vec!["one"]);

    store
      .update("log", "entries", |current: Option<Vec<String>>| {
        let mut entries = current.unwrap_or_default();
        entries.push("two".to_string());
        entries
      })
      .unwrap();

    let out: Vec<String> = store.read("log", "entries").unwrap();
    assert_eq!(out, vec!["one", "two"]);
  }

  #[test]
  fn collections_reports_counts() {
    let (store, _temp) = test_store();
    store.write("remotes", "official", &json!({})).unwrap();
    store.write("installs", "a", &json!(1)).unwrap();
    store.write("installs", "b", &json!(2)).unwrap();
    fs::write(store.root().join("installs").join("c.json.tmp"), "x").unwrap();

    let collections = store.collections().unwrap();
    let names: Vec<_> = collections.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["installs", "remotes"]);
    assert_eq!(collections[0].records, 2);
    assert_eq!(collections[0].bytes, 4);
    assert!(collections[0].modified_unix.is_some());
    assert_eq!(collections[1].records, 1);
  }

  #[test]
  #[traced_test]
  fn prune_removes_only_temp_files() {
    let (store, _temp) = test_store();
    store.write("installs", "blender", &json!(1)).unwrap();
    let stale = store.resolve("installs", "crashed").unwrap().temp;
    fs::write(&stale, "{\"half\": ").unwrap();

    let removed = store.prune_temp_files().unwrap();
    assert_eq!(removed, vec![stale.clone()]);
    assert!(!stale.exists());
    assert!(store.exists("installs", "blender").unwrap());
    assert!(logs_contain("pruned stale temp files"));

    assert!(store.prune_temp_files().unwrap().is_empty());
  }

  #[test]
  fn writes_register_one_lock_per_collection() {
    let (store, _temp) = test_store();
    store.write("installs", "a", &json!(1)).unwrap();
    store.write("installs", "b", &json!(1)).unwrap();
    store.write("remotes", "a", &json!(1)).unwrap();
    assert_eq!(store.lock_count(), 2);
  }
}
