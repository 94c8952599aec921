//! On-disk record encoding.
//!
//! Records are pretty-printed JSON, tab indented, with a single trailing
//! newline so files diff cleanly. Object keys are always written in sorted
//! order, whatever map type the record uses.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::StoreError;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
  // `Value` objects are BTreeMap-backed, so this pass sorts every map's keys.
  let value = serde_json::to_value(value).map_err(StoreError::EncodeFailure)?;

  let mut buf = Vec::with_capacity(128);
  let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
  value.serialize(&mut serializer).map_err(StoreError::EncodeFailure)?;
  buf.push(b'\n');
  Ok(buf)
}

/// Decodes a record. The caller attaches the file path when mapping the error.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
  serde_json::from_slice(bytes)
}
