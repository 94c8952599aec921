use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{Result, Store};

/// Typed handle over a single collection.
///
/// Every record in the collection is expected to decode as `T`. A collection
/// that has never been written to behaves as empty.
pub struct Collection<'a, T> {
  store: &'a Store,
  name: String,
  _record: PhantomData<fn() -> T>,
}

impl<'a, T> Collection<'a, T> {
  pub(super) fn new(store: &'a Store, name: &str) -> Self {
    Self {
      store,
      name: name.to_string(),
      _record: PhantomData,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl<T: Serialize + DeserializeOwned> Collection<'_, T> {
  pub fn get(&self, resource: &str) -> Result<T> {
    self.store.read(&self.name, resource)
  }

  pub fn put(&self, resource: &str, record: &T) -> Result<()> {
    self.store.write(&self.name, resource, record)
  }

  pub fn contains(&self, resource: &str) -> Result<bool> {
    self.store.exists(&self.name, resource)
  }

  pub fn update<F>(&self, resource: &str, f: F) -> Result<T>
  where
    F: FnOnce(Option<T>) -> T,
  {
    self.store.update(&self.name, resource, f)
  }

  /// All records with their resource names, in directory listing order.
  pub fn list(&self) -> Result<Vec<(String, T)>> {
    let records = match self.store.read_all(&self.name) {
      Ok(records) => records,
      Err(e) if e.is_not_found() => return Ok(Vec::new()),
      Err(e) => return Err(e),
    };

    records
      .into_iter()
      .map(|record| {
        let value = record.decode::<T>()?;
        Ok((record.resource, value))
      })
      .collect()
  }

  /// Remove one record. An empty `resource` is rejected, never treated as
  /// the whole collection.
  pub fn remove(&self, resource: &str) -> Result<()> {
    self.store.delete_record(&self.name, resource)
  }

  /// Remove every record. Clearing a collection that does not exist is a no-op.
  pub fn clear(&self) -> Result<()> {
    match self.store.delete_collection(&self.name) {
      Err(e) if e.is_not_found() => Ok(()),
      other => other,
    }
  }
}
