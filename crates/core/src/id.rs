//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;
use crate::value_object::ValueObject;

/// Normalized inventory item name; doubles as the document-store key.
///
/// Construction trims surrounding whitespace and lower-cases the input, so
/// `"Apple"`, `"apple"` and `" APPLE "` all address the same record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemName(String);

impl ItemName {
    /// Parse and normalize user input into an item name.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        // Document keys are path segments in the store.
        if normalized.contains('/') {
            return Err(DomainError::validation(format!(
                "item name cannot contain '/': {normalized}"
            )));
        }
        if is_reserved_key(&normalized) {
            return Err(DomainError::validation(format!(
                "item name is reserved by the store: {normalized}"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `.`, `..` and `__name__` are not valid document ids.
fn is_reserved_key(key: &str) -> bool {
    let dunder = key.len() >= 4 && key.starts_with("__") && key.ends_with("__");
    key == "." || key == ".." || dunder
}

impl ValueObject for ItemName {}

impl core::fmt::Display for ItemName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ItemName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
