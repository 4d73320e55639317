//! Configuration.
//!
//! Configuration is read from JSON and passed explicitly to whatever needs it. Every field has a
//! default, so an empty object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
  /// Directory shader source paths are relative to.
  pub resource_root: PathBuf,
  /// Version in the `#version` header of generated GLSL.
  pub glsl_version: u16,
  /// Profile in the `#version` header of generated GLSL, if any.
  pub glsl_profile: Option<String>,
  /// Log generated sources, line by line, at debug level.
  pub log_generated_source: bool,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      resource_root: PathBuf::from("."),
      glsl_version: 330,
      glsl_profile: Some("core".to_owned()),
      log_generated_source: true,
    }
  }
}

impl Config {
  pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
  }

  /// Load a configuration file.
  pub fn load<P>(path: P) -> Result<Self, ConfigError>
  where P: AsRef<Path> {
    let path = path.as_ref();
    let json =
      fs::read_to_string(path).map_err(|e| ConfigError::CannotRead(path.to_owned(), e.to_string()))?;

    Self::from_json_str(&json)
  }

  /// Path of a resource, relative to the resource root.
  pub fn resource_path<P>(&self, path: P) -> PathBuf
  where P: AsRef<Path> {
    self.resource_root.join(path)
  }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
  CannotRead(PathBuf, String),
  Malformed(String),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ConfigError::CannotRead(ref path, ref reason) => {
        write!(f, "cannot read configuration {}: {}", path.display(), reason)
      }

      ConfigError::Malformed(ref reason) => write!(f, "malformed configuration: {}", reason),
    }
  }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let config = Config::from_json_str("{}").unwrap();

    assert_eq!(config, Config::default());
    assert_eq!(config.glsl_version, 330);
    assert_eq!(config.glsl_profile.as_ref().map(String::as_str), Some("core"));
  }

  #[test]
  fn partial() {
    let config =
      Config::from_json_str(r#"{ "resource_root": "data", "glsl_profile": null }"#).unwrap();

    assert_eq!(config.resource_path("shaders/pnt.shader"), Path::new("data/shaders/pnt.shader"));
    assert_eq!(config.glsl_profile, None);
    assert!(config.log_generated_source);
  }

  #[test]
  fn malformed() {
    assert!(matches!(Config::from_json_str("{ glsl_version: 330 }"), Err(ConfigError::Malformed(_))));
    assert!(matches!(
      Config::load("no/such/config.json"),
      Err(ConfigError::CannotRead(..))
    ));
  }
}
