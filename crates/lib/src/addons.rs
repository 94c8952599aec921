//! Blender addons, stored in the `addons` collection keyed by id.
//!
//! Addon support is opt-in through the `features.addons` setting. The
//! repository itself does not check the toggle; callers decide whether to.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::{Collection, Result, Store};

pub const COLLECTION: &str = "addons";

/// Where an addon's archive comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddonSource {
  /// File name of the archive once downloaded.
  pub file: String,
  pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Addon {
  pub id: String,
  /// Package reference the addon was resolved from, if any.
  #[serde(default)]
  pub reference: String,
  pub name: String,
  pub addon_version: String,
  #[serde(default)]
  pub source: AddonSource,
}

pub struct AddonRepository<'a> {
  addons: Collection<'a, Addon>,
}

impl<'a> AddonRepository<'a> {
  pub fn new(store: &'a Store) -> Self {
    Self {
      addons: store.collection(COLLECTION),
    }
  }

  /// All addons, sorted by id.
  pub fn find_all(&self) -> Result<Vec<Addon>> {
    let mut addons: Vec<_> = self.addons.list()?.into_iter().map(|(_, a)| a).collect();
    addons.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(addons)
  }

  pub fn find_by_id(&self, id: &str) -> Result<Addon> {
    self.addons.get(id)
  }

  /// Store `addon`, replacing any addon with the same id.
  pub fn create(&self, addon: &Addon) -> Result<()> {
    self.addons.put(&addon.id, addon)?;
    info!(id = %addon.id, version = %addon.addon_version, "registered addon");
    Ok(())
  }

  pub fn remove(&self, id: &str) -> Result<()> {
    self.addons.remove(id)?;
    info!(id = %id, "removed addon");
    Ok(())
  }
}
