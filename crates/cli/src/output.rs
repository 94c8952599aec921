//! Terminal and JSON output for rkb.
//!
//! Status lines carry a colored marker; listings are rows of `name detail`
//! with optional indented fields underneath.

use std::io::Write;
use std::time::{Duration, UNIX_EPOCH};

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Kind of status line. `Warn` and `Fail` go to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
  Done,
  Note,
  Warn,
  Fail,
}

impl Tone {
  fn marker(self) -> &'static str {
    match self {
      Tone::Done => "✓",
      Tone::Note => "•",
      Tone::Warn => "⚠",
      Tone::Fail => "✗",
    }
  }
}

pub fn say(tone: Tone, message: &str) {
  let marker = tone.marker();
  match tone {
    Tone::Done => println!("{} {}", marker.if_supports_color(Stream::Stdout, |m| m.green()), message),
    Tone::Note => println!("{} {}", marker.if_supports_color(Stream::Stdout, |m| m.blue()), message),
    Tone::Warn => eprintln!(
      "{} {}",
      marker.if_supports_color(Stream::Stderr, |m| m.yellow()),
      message.if_supports_color(Stream::Stderr, |m| m.yellow())
    ),
    Tone::Fail => eprintln!(
      "{} {}",
      marker.if_supports_color(Stream::Stderr, |m| m.red()),
      message.if_supports_color(Stream::Stderr, |m| m.red())
    ),
  }
}

/// One entry of a listing.
pub fn row(name: &str, detail: &str) {
  println!(
    "  {} {} {}",
    Tone::Note.marker().if_supports_color(Stream::Stdout, |m| m.dimmed()),
    name.if_supports_color(Stream::Stdout, |n| n.bold()),
    detail
  );
}

/// Indented `label: value` line, under a row or on its own.
pub fn field(label: &str, value: &str) {
  println!("    {}: {}", label.if_supports_color(Stream::Stdout, |l| l.dimmed()), value);
}

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  let mut out = std::io::stdout().lock();
  serde_json::to_writer_pretty(&mut out, value).context("Failed to serialize output")?;
  writeln!(out).context("Failed to write output")?;
  Ok(())
}

/// First 12 characters of a checksum.
pub fn short_hash(hash: &str) -> &str {
  match hash.char_indices().nth(12) {
    Some((end, _)) => &hash[..end],
    None => hash,
  }
}

pub fn size(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }

  let mut value = bytes as f64 / 1024.0;
  let mut unit = UNITS[0];
  for next in &UNITS[1..] {
    if value < 1024.0 {
      break;
    }
    value /= 1024.0;
    unit = next;
  }
  format!("{:.1} {}", value, unit)
}

/// Elapsed time rounded to milliseconds, e.g. `1m 5s 20ms`.
pub fn elapsed(duration: Duration) -> String {
  let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
  humantime::format_duration(Duration::from_millis(millis)).to_string()
}

pub fn timestamp(unix_secs: u64) -> String {
  humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(unix_secs)).to_string()
}
