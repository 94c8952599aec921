//! User settings, persisted as a single record at `preferences/settings`.
//!
//! Settings are addressed by dotted camelCase keys (`logLevel`,
//! `features.addons`) so the CLI can get and set them as strings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::platform::paths::{installations_dir, packages_dir};
use crate::platform::{Platform, UnknownPlatform};
use crate::store::{Store, StoreError};

pub const COLLECTION: &str = "preferences";
pub const RESOURCE: &str = "settings";

pub const DEFAULT_BUILD: &str = "github.com/rocketblend/official-library/packages/v0/builds/blender/4.2.2";

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub const KEYS: [&str; 6] = [
  "platform",
  "defaultBuild",
  "logLevel",
  "installationsPath",
  "packagesPath",
  "features.addons",
];

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("unknown setting '{0}' (expected one of: {keys})", keys = KEYS.join(", "))]
  UnknownKey(String),

  #[error("invalid value '{value}' for {key}: {reason}")]
  InvalidValue {
    key: &'static str,
    value: String,
    reason: String,
  },

  #[error(transparent)]
  Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
  pub addons: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
  pub platform: Option<Platform>,
  pub default_build: String,
  pub log_level: String,
  pub installations_path: PathBuf,
  pub packages_path: PathBuf,
  pub features: Features,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      platform: Platform::current(),
      default_build: DEFAULT_BUILD.to_string(),
      log_level: "info".to_string(),
      installations_path: installations_dir(),
      packages_path: packages_dir(),
      features: Features::default(),
    }
  }
}

impl Settings {
  pub fn get(&self, key: &str) -> Result<String, SettingsError> {
    let value = match key {
      "platform" => self.platform.map(|p| p.to_string()).unwrap_or_default(),
      "defaultBuild" => self.default_build.clone(),
      "logLevel" => self.log_level.clone(),
      "installationsPath" => self.installations_path.display().to_string(),
      "packagesPath" => self.packages_path.display().to_string(),
      "features.addons" => self.features.addons.to_string(),
      _ => return Err(SettingsError::UnknownKey(key.to_string())),
    };
    Ok(value)
  }

  /// Every setting as a `(key, value)` pair, in [`KEYS`] order.
  pub fn values(&self) -> Vec<(&'static str, String)> {
    KEYS
      .iter()
      .filter_map(|key| self.get(key).ok().map(|value| (*key, value)))
      .collect()
  }

  pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
    Change::parse(key, value)?.apply(self);
    Ok(())
  }

  pub fn validate(&self) -> Result<(), SettingsError> {
    Change::parse("logLevel", &self.log_level)?;
    Change::parse("defaultBuild", &self.default_build)?;
    Ok(())
  }
}

/// A validated assignment to one setting.
enum Change {
  Platform(Platform),
  DefaultBuild(String),
  LogLevel(String),
  InstallationsPath(PathBuf),
  PackagesPath(PathBuf),
  Addons(bool),
}

impl Change {
  fn parse(key: &str, value: &str) -> Result<Self, SettingsError> {
    let invalid = |key: &'static str, reason: String| SettingsError::InvalidValue {
      key,
      value: value.to_string(),
      reason,
    };

    match key {
      "platform" => value
        .parse()
        .map(Change::Platform)
        .map_err(|e: UnknownPlatform| invalid("platform", e.to_string())),
      "defaultBuild" if value.trim().is_empty() => Err(invalid("defaultBuild", "must not be empty".to_string())),
      "defaultBuild" => Ok(Change::DefaultBuild(value.to_string())),
      "logLevel" => {
        let level = value.to_ascii_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
          Ok(Change::LogLevel(level))
        } else {
          Err(invalid("logLevel", format!("expected one of: {}", LOG_LEVELS.join(", "))))
        }
      }
      "installationsPath" if value.is_empty() => Err(invalid("installationsPath", "must not be empty".to_string())),
      "installationsPath" => Ok(Change::InstallationsPath(PathBuf::from(value))),
      "packagesPath" if value.is_empty() => Err(invalid("packagesPath", "must not be empty".to_string())),
      "packagesPath" => Ok(Change::PackagesPath(PathBuf::from(value))),
      "features.addons" => value
        .parse()
        .map(Change::Addons)
        .map_err(|_| invalid("features.addons", "expected true or false".to_string())),
      _ => Err(SettingsError::UnknownKey(key.to_string())),
    }
  }

  fn apply(self, settings: &mut Settings) {
    match self {
      Change::Platform(platform) => settings.platform = Some(platform),
      Change::DefaultBuild(build) => settings.default_build = build,
      Change::LogLevel(level) => settings.log_level = level,
      Change::InstallationsPath(path) => settings.installations_path = path,
      Change::PackagesPath(path) => settings.packages_path = path,
      Change::Addons(enabled) => settings.features.addons = enabled,
    }
  }
}

pub struct SettingsRepository<'a> {
  store: &'a Store,
}

impl<'a> SettingsRepository<'a> {
  pub fn new(store: &'a Store) -> Self {
    Self { store }
  }

  /// Load the stored settings, writing the defaults first if none exist.
  pub fn load(&self) -> Result<Settings, SettingsError> {
    match self.store.read(COLLECTION, RESOURCE) {
      Ok(settings) => Ok(settings),
      Err(e) if e.is_not_found() => {
        let settings = self
          .store
          .update(COLLECTION, RESOURCE, |current: Option<Settings>| current.unwrap_or_default())?;
        info!("created default settings");
        Ok(settings)
      }
      Err(e) => Err(e.into()),
    }
  }

  /// The stored settings, or `None` if none have been written. Never writes.
  pub fn find(&self) -> Result<Option<Settings>, SettingsError> {
    match self.store.read(COLLECTION, RESOURCE) {
      Ok(settings) => Ok(Some(settings)),
      Err(e) if e.is_not_found() => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
    settings.validate()?;
    self.store.write(COLLECTION, RESOURCE, settings)?;
    Ok(())
  }

  pub fn get_value(&self, key: &str) -> Result<String, SettingsError> {
    self.load()?.get(key)
  }

  /// Validate and store a single setting, returning the updated settings.
  pub fn set_value(&self, key: &str, value: &str) -> Result<Settings, SettingsError> {
    let change = Change::parse(key, value)?;
    let settings = self.store.update(COLLECTION, RESOURCE, |current: Option<Settings>| {
      let mut settings = current.unwrap_or_default();
      change.apply(&mut settings);
      settings
    })?;
    info!(key = %key, value = %value, "updated setting");
    Ok(settings)
  }
}
