//! Install command implementations.
//!
//! Registers, lists and forgets Blender installations. Downloading and
//! extracting builds happens elsewhere; these commands only manage the records.

use anyhow::{Context, Result};

use rocketblend_lib::installs::{InstallRepository, Installation};
use rocketblend_lib::store::Store;

use crate::output::{OutputFormat, Tone, field, json, row, say, short_hash};

pub fn cmd_install_add(store: &Store, install: &Installation, output: OutputFormat) -> Result<()> {
  if !install.path.exists() {
    say(Tone::Warn, &format!("Install path does not exist: {}", install.path.display()));
  }

  InstallRepository::new(store)
    .create(install)
    .with_context(|| format!("Failed to register installation '{}'", install.id))?;

  if output.is_json() {
    json(install)?;
  } else {
    say(Tone::Done, &format!("Registered {} ({})", install.id, install.version));
  }

  Ok(())
}

pub fn cmd_install_list(store: &Store, verbose: bool, output: OutputFormat) -> Result<()> {
  let installs = InstallRepository::new(store)
    .find_all()
    .context("Failed to list installations")?;

  if output.is_json() {
    return json(&installs);
  }

  if installs.is_empty() {
    say(Tone::Note, "No installations registered. Run 'rkb install add' to register one.");
    return Ok(());
  }

  for install in &installs {
    row(&install.id, &install.version);
    if verbose {
      field("Path", &install.path.display().to_string());
      if !install.hash.is_empty() {
        field("Hash", short_hash(&install.hash));
      }
    }
  }

  Ok(())
}

pub fn cmd_install_remove(store: &Store, id: &str, output: OutputFormat) -> Result<()> {
  InstallRepository::new(store)
    .remove(id)
    .with_context(|| format!("Failed to remove installation '{}'", id))?;

  if output.is_json() {
    json(&serde_json::json!({ "removed": id }))?;
  } else {
    say(Tone::Done, &format!("Removed {}", id));
  }

  Ok(())
}
