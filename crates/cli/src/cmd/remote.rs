use anyhow::{Context, Result};

use rocketblend_lib::remotes::{Remote, RemoteRepository};
use rocketblend_lib::store::Store;

use crate::output::{OutputFormat, Tone, json, row, say};

pub fn cmd_remote_add(store: &Store, name: String, url: String, output: OutputFormat) -> Result<()> {
  let remote = Remote { name, url };
  RemoteRepository::new(store)
    .add(&remote)
    .with_context(|| format!("Failed to add remote '{}'", remote.name))?;

  if output.is_json() {
    json(&remote)?;
  } else {
    say(Tone::Done, &format!("Added remote {} → {}", remote.name, remote.url));
  }

  Ok(())
}

pub fn cmd_remote_list(store: &Store, output: OutputFormat) -> Result<()> {
  let remotes = RemoteRepository::new(store).find_all().context("Failed to list remotes")?;

  if output.is_json() {
    return json(&remotes);
  }

  if remotes.is_empty() {
    say(Tone::Note, "No remotes configured.");
    return Ok(());
  }

  for remote in &remotes {
    row(&remote.name, &remote.url);
  }

  Ok(())
}

pub fn cmd_remote_remove(store: &Store, name: &str, output: OutputFormat) -> Result<()> {
  RemoteRepository::new(store)
    .remove(name)
    .with_context(|| format!("Failed to remove remote '{}'", name))?;

  if output.is_json() {
    json(&serde_json::json!({ "removed": name }))?;
  } else {
    say(Tone::Done, &format!("Removed remote {}", name));
  }

  Ok(())
}
