//! Preprocessor define sets.
//!
//! A define set maps case-sensitive identifiers to an optional textual value. Only the presence of
//! a key gates conditional regions. Keys are kept sorted, so two define sets built in a different
//! order compare and hash the same: this is the canonical form used in cache keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::iter::FromIterator;

#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct DefineSet(BTreeMap<String, String>);

impl DefineSet {
  pub fn new() -> Self {
    DefineSet(BTreeMap::new())
  }

  /// Add a define with an empty value.
  pub fn with<K>(mut self, key: K) -> Self
  where K: Into<String> {
    self.insert(key, "");
    self
  }

  /// Add or replace a define.
  pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<String>
  where K: Into<String>,
        V: Into<String> {
    self.0.insert(key.into(), value.into())
  }

  pub fn remove(&mut self, key: &str) -> Option<String> {
    self.0.remove(key)
  }

  pub fn is_defined(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

impl<K, V> FromIterator<(K, V)> for DefineSet
where K: Into<String>,
      V: Into<String> {
  fn from_iter<I>(iter: I) -> Self
  where I: IntoIterator<Item = (K, V)> {
    DefineSet(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

impl From<HashMap<String, String>> for DefineSet {
  fn from(map: HashMap<String, String>) -> Self {
    map.into_iter().collect()
  }
}

impl fmt::Display for DefineSet {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.write_str("{")?;

    for (i, (k, v)) in self.iter().enumerate() {
      if i > 0 {
        f.write_str(", ")?;
      }

      if v.is_empty() {
        f.write_str(k)?;
      } else {
        write!(f, "{}={}", k, v)?;
      }
    }

    f.write_str("}")
  }
}
