//! Addon command implementations.
//!
//! Addon records can always be managed, but `add` warns while the
//! `features.addons` setting is off since nothing will load them.

use anyhow::{Context, Result};

use rocketblend_lib::addons::{Addon, AddonRepository};
use rocketblend_lib::settings::SettingsRepository;
use rocketblend_lib::store::Store;

use crate::output::{OutputFormat, Tone, field, json, row, say};

pub fn cmd_addon_add(store: &Store, addon: &Addon, output: OutputFormat) -> Result<()> {
  let enabled = SettingsRepository::new(store)
    .find()
    .context("Failed to read settings")?
    .is_some_and(|settings| settings.features.addons);
  if !enabled {
    say(
      Tone::Warn,
      "Addon support is disabled. Run 'rkb config set features.addons true' to enable it.",
    );
  }

  AddonRepository::new(store)
    .create(addon)
    .with_context(|| format!("Failed to register addon '{}'", addon.id))?;

  if output.is_json() {
    json(addon)?;
  } else {
    say(Tone::Done, &format!("Registered addon {} ({})", addon.id, addon.addon_version));
  }

  Ok(())
}

pub fn cmd_addon_list(store: &Store, verbose: bool, output: OutputFormat) -> Result<()> {
  let addons = AddonRepository::new(store).find_all().context("Failed to list addons")?;

  if output.is_json() {
    return json(&addons);
  }

  if addons.is_empty() {
    say(Tone::Note, "No addons registered.");
    return Ok(());
  }

  for addon in &addons {
    row(&addon.id, &format!("{} {}", addon.name, addon.addon_version));
    if verbose {
      if !addon.reference.is_empty() {
        field("Reference", &addon.reference);
      }
      if !addon.source.url.is_empty() {
        field("Source", &addon.source.url);
      }
    }
  }

  Ok(())
}

pub fn cmd_addon_remove(store: &Store, id: &str, output: OutputFormat) -> Result<()> {
  AddonRepository::new(store)
    .remove(id)
    .with_context(|| format!("Failed to remove addon '{}'", id))?;

  if output.is_json() {
    json(&serde_json::json!({ "removed": id }))?;
  } else {
    say(Tone::Done, &format!("Removed addon {}", id));
  }

  Ok(())
}
