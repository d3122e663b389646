//! Strategy configuration options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ReplicationError, Result};

/// Option name -> value mapping a strategy is constructed from.
///
/// Owned by the strategy instance and never mutated after construction.
/// Serializes as a plain JSON object so it can live in persisted schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicationOptions(BTreeMap<String, String>);

impl ReplicationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Option names, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReplicationOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<BTreeMap<String, String>> for ReplicationOptions {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

/// Parse a replication factor value. Surrounding whitespace is ignored.
pub fn parse_replication_factor(key: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        ReplicationError::InvalidConfiguration(format!(
            "{key}: '{value}' is not a valid replication factor"
        ))
    })
}
