//! Item metadata: a string-to-string mapping with enumerated accessor failure.
//!
//! Front matter is loosely typed at the source; accessors here make the two
//! failure modes explicit instead of defaulting silently: a field can be
//! [`MetadataError::Missing`] or present but [`MetadataError::Unparsable`].

use crate::utils::date::DateTimeUtc;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("missing metadata field `{0}`")]
    Missing(String),

    #[error("metadata field `{field}` has unparsable value `{value}`")]
    Unparsable { field: String, value: String },
}

/// Front-matter key/value pairs attached to an item.
#[derive(Debug, Clone, Default)]
pub struct Metadata(BTreeMap<String, String>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Access a required field.
    pub fn require(&self, key: &str) -> Result<&str, MetadataError> {
        self.get(key)
            .ok_or_else(|| MetadataError::Missing(key.to_owned()))
    }

    /// Parse a field as a UTC date (`YYYY-MM-DD` or RFC 3339).
    pub fn date(&self, key: &str) -> Result<DateTimeUtc, MetadataError> {
        let value = self.require(key)?;
        DateTimeUtc::parse(value).ok_or_else(|| MetadataError::Unparsable {
            field: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Split a field on `delimiter`, trimming whitespace and dropping empty
    /// entries. A missing field is an empty list, not an error: absence of
    /// tags is a normal state.
    pub fn list(&self, key: &str, delimiter: char) -> Vec<String> {
        self.get(key)
            .map(|value| {
                value
                    .split(delimiter)
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
