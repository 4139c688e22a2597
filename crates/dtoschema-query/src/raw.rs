//! # Raw Parameters
//!
//! HTTP query and path values arrive as strings. A key that appears once
//! is a [`RawParam::Single`]; a repeated key collects into
//! [`RawParam::Many`] in arrival order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// One raw query/path value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawParam {
    Single(String),
    Many(Vec<String>),
}

impl RawParam {
    /// The scalar, or the first element of a repeated key.
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s),
            Self::Many(values) => values.first().map(String::as_str),
        }
    }

    /// Every value, in arrival order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(s) => vec![s.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Append another occurrence, promoting to `Many`.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(first) => {
                let first = std::mem::take(first);
                *self = Self::Many(vec![first, value]);
            }
            Self::Many(values) => values.push(value),
        }
    }
}

impl From<&str> for RawParam {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

impl From<String> for RawParam {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<Vec<String>> for RawParam {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for RawParam {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Decoded query string, keys in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryMap {
    params: IndexMap<String, RawParam>,
}

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Malformed`] if the string cannot be decoded.
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)?;
        Ok(pairs.into_iter().collect())
    }

    /// Record one occurrence of `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.params.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut slot) => slot.get_mut().push(value),
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(RawParam::Single(value));
            }
        }
    }

    /// Replace whatever `key` held.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawParam>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawParam> {
        self.params.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// A copy with `keys` removed, remaining keys in their original order.
    pub fn without<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Self {
        let mut map = self.clone();
        for key in keys {
            map.params.shift_remove(key);
        }
        map
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, RawParam> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.append(key, value);
        }
        map
    }
}

impl<'a> IntoIterator for &'a QueryMap {
    type Item = (&'a String, &'a RawParam);
    type IntoIter = indexmap::map::Iter<'a, String, RawParam>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
