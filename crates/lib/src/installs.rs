//! Installed Blender builds.
//!
//! Each installation is one record in the `installs` collection, keyed by its id.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{Collection, Result, Store};

pub const COLLECTION: &str = "installs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installation {
  pub id: String,
  pub path: PathBuf,
  pub version: String,
  #[serde(default)]
  pub hash: String,
}

pub struct InstallRepository<'a> {
  installs: Collection<'a, Installation>,
}

impl<'a> InstallRepository<'a> {
  pub fn new(store: &'a Store) -> Self {
    Self {
      installs: store.collection(COLLECTION),
    }
  }

  /// All installations, sorted by id.
  pub fn find_all(&self) -> Result<Vec<Installation>> {
    let mut installs: Vec<_> = self.installs.list()?.into_iter().map(|(_, i)| i).collect();
    installs.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(installs)
  }

  pub fn find_by_id(&self, id: &str) -> Result<Installation> {
    self.installs.get(id)
  }

  /// Store `install`, replacing any installation with the same id.
  pub fn create(&self, install: &Installation) -> Result<()> {
    self.installs.put(&install.id, install)?;
    info!(id = %install.id, path = ?install.path, "registered installation");
    Ok(())
  }

  pub fn remove(&self, id: &str) -> Result<()> {
    self.installs.remove(id)?;
    info!(id = %id, "removed installation");
    Ok(())
  }
}
