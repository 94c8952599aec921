pub mod paths;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Platforms that Blender builds are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
  Windows,
  Linux,
  MacosIntel,
  MacosApple,
}

impl Platform {
  pub const ALL: [Platform; 4] = [
    Platform::Windows,
    Platform::Linux,
    Platform::MacosIntel,
    Platform::MacosApple,
  ];

  /// Detect the current platform at runtime
  ///
  /// Returns `None` if the OS or architecture has no published builds
  pub fn current() -> Option<Self> {
    Self::from_consts(std::env::consts::OS, std::env::consts::ARCH)
  }

  fn from_consts(os: &str, arch: &str) -> Option<Self> {
    match (os, arch) {
      ("windows", _) => Some(Self::Windows),
      ("linux", _) => Some(Self::Linux),
      ("macos", "x86_64") => Some(Self::MacosIntel),
      ("macos", "aarch64") => Some(Self::MacosApple),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Windows => "windows",
      Self::Linux => "linux",
      Self::MacosIntel => "macos/intel",
      Self::MacosApple => "macos/apple",
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform '{0}'")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
  type Err = UnknownPlatform;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|p| p.as_str() == s)
      .ok_or_else(|| UnknownPlatform(s.to_string()))
  }
}

impl Serialize for Platform {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for Platform {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}
