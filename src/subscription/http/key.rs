//! Hierarchical cache keys.
//!
//! A [`QueryKey`] is an ordered list of [`KeySegment`]s. Keys form a tree:
//! `["books"]` is the parent of `["books", "list"]`, which is the parent of
//! `["books", "list", {"filters": "rust"}]`. Cache operations take a key as a
//! *prefix* and affect every entry underneath it.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// One element of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeySegment {
    /// Placeholder for an unset parameter, e.g. a detail query without an id.
    Null,
    Number(u64),
    Str(String),
    /// A parameter object such as a list filter.
    Object(BTreeMap<String, String>),
}

impl KeySegment {
    /// Build an object segment from `(name, value)` pairs.
    pub fn object<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<u64> for KeySegment {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<KeySegment>> From<Option<T>> for KeySegment {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Address of a cached query result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct QueryKey(Vec<KeySegment>);

impl QueryKey {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// A new key with `segment` appended.
    #[must_use]
    pub fn with(&self, segment: impl Into<KeySegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` addresses this key: every segment of `prefix` equals
    /// the segment at the same position here. A key starts with itself, and
    /// every key starts with the empty key.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Whether this key is `other` followed by at least one more segment.
    #[must_use]
    pub fn is_strict_extension_of(&self, other: &Self) -> bool {
        self.len() > other.len() && self.starts_with(other)
    }
}

impl<S: Into<KeySegment>> FromIterator<S> for QueryKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for QueryKey {
    fn from(value: &str) -> Self {
        Self(vec![value.into()])
    }
}

impl From<&QueryKey> for QueryKey {
    fn from(value: &QueryKey) -> Self {
        value.clone()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
