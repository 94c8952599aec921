//! Package library remotes, stored in the `remotes` collection keyed by name.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{Collection, Result, Store};

pub const COLLECTION: &str = "remotes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
  pub name: String,
  pub url: String,
}

pub struct RemoteRepository<'a> {
  remotes: Collection<'a, Remote>,
}

impl<'a> RemoteRepository<'a> {
  pub fn new(store: &'a Store) -> Self {
    Self {
      remotes: store.collection(COLLECTION),
    }
  }

  /// All remotes, sorted by name.
  pub fn find_all(&self) -> Result<Vec<Remote>> {
    let mut remotes: Vec<_> = self.remotes.list()?.into_iter().map(|(_, r)| r).collect();
    remotes.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(remotes)
  }

  pub fn add(&self, remote: &Remote) -> Result<()> {
    self.remotes.put(&remote.name, remote)?;
    info!(name = %remote.name, url = %remote.url, "added remote");
    Ok(())
  }

  pub fn remove(&self, name: &str) -> Result<()> {
    self.remotes.remove(name)?;
    info!(name = %name, "removed remote");
    Ok(())
  }
}
