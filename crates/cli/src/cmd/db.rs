//! Database maintenance commands.

use std::time::Instant;

use anyhow::{Context, Result};

use rocketblend_lib::store::Store;

use crate::output::{OutputFormat, Tone, elapsed, field, json, row, say, size, timestamp};

pub fn cmd_db_status(store: &Store, output: OutputFormat) -> Result<()> {
  let collections = store.collections().context("Failed to read database")?;

  if output.is_json() {
    return json(&serde_json::json!({
      "root": store.root(),
      "collections": collections,
    }));
  }

  field("Location", &store.root().display().to_string());

  if collections.is_empty() {
    say(Tone::Note, "Database is empty.");
    return Ok(());
  }

  println!();
  for collection in &collections {
    let modified = collection.modified_unix.map(timestamp).unwrap_or_else(|| "never".to_string());
    row(
      &collection.name,
      &format!(
        "{} record(s), {}, modified {}",
        collection.records,
        size(collection.bytes),
        modified
      ),
    );
  }

  Ok(())
}

pub fn cmd_db_prune(store: &Store, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let removed = store.prune_temp_files().context("Failed to prune database")?;

  if output.is_json() {
    json(&serde_json::json!({ "removed": removed }))?;
  } else {
    say(Tone::Done, &format!("Removed {} stale temp file(s)", removed.len()));
    field("Duration", &elapsed(start.elapsed()));
  }

  Ok(())
}
