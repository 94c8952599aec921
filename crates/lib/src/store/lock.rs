//! Per-collection mutual exclusion.
//!
//! Writes and deletes within one collection are serialized through a mutex
//! owned by the registry. Different collections never contend with each other.
//! Entries are created on first use and live as long as the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type CollectionLock = Arc<Mutex<()>>;

#[derive(Debug, Default)]
pub struct LockRegistry {
  locks: Mutex<HashMap<String, CollectionLock>>,
}

impl LockRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the lock for `collection`, creating it if this is the first request.
  ///
  /// The lookup and insert happen under the registry mutex, so concurrent
  /// callers asking for the same name always receive the same lock.
  pub fn lock_for(&self, collection: &str) -> CollectionLock {
    let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(lock) = locks.get(collection) {
      return Arc::clone(lock);
    }

    let lock = CollectionLock::default();
    locks.insert(collection.to_string(), Arc::clone(&lock));
    lock
  }

  pub fn len(&self) -> usize {
    self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Blocks until `lock` is free.
///
/// A writer that panicked mid-operation poisons the mutex; the guarded data is
/// `()`, so the poison carries no state and is cleared.
pub fn acquire(lock: &CollectionLock) -> MutexGuard<'_, ()> {
  lock.lock().unwrap_or_else(PoisonError::into_inner)
}
