use std::collections::BTreeMap;

use anyhow::{Context, Result};

use rocketblend_lib::settings::SettingsRepository;
use rocketblend_lib::store::Store;

use crate::output::{OutputFormat, Tone, field, json, say};

pub fn cmd_config_list(store: &Store, output: OutputFormat) -> Result<()> {
  let settings = SettingsRepository::new(store).load().context("Failed to load settings")?;

  if output.is_json() {
    return json(&settings);
  }

  for (key, value) in settings.values() {
    field(key, &value);
  }

  Ok(())
}

pub fn cmd_config_get(store: &Store, key: &str, output: OutputFormat) -> Result<()> {
  let value = SettingsRepository::new(store).get_value(key)?;

  if output.is_json() {
    json(&BTreeMap::from([(key, &value)]))?;
  } else {
    println!("{}", value);
  }

  Ok(())
}

pub fn cmd_config_set(store: &Store, key: &str, value: &str, output: OutputFormat) -> Result<()> {
  let settings = SettingsRepository::new(store).set_value(key, value)?;

  if output.is_json() {
    json(&settings)?;
  } else {
    say(Tone::Done, &format!("Set {} = {}", key, settings.get(key)?));
  }

  Ok(())
}
