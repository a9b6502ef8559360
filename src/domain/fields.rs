//! Item field primitives
//!
//! Validated name and description values. Both are trimmed on construction and
//! bounds are checked on character count, so an invalid value cannot exist.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::DomainError;

/// Minimum name length (characters, after trimming)
pub const NAME_MIN_LEN: usize = 2;

/// Maximum name length (characters, after trimming)
pub const NAME_MAX_LEN: usize = 50;

/// Maximum description length (characters, after trimming)
pub const DESCRIPTION_MAX_LEN: usize = 1000;

/// Display name of a revise item.
///
/// # Invariants
/// - No leading or trailing whitespace
/// - Between 2 and 50 characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Trim and validate a name.
    ///
    /// # Errors
    /// - `DomainError::Validation` on field `name` if the trimmed length is out of bounds
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let len = trimmed.chars().count();

        if len < NAME_MIN_LEN {
            return Err(DomainError::validation(
                "name",
                format!("must be at least {NAME_MIN_LEN} characters (got {len})"),
            ));
        }
        if len > NAME_MAX_LEN {
            return Err(DomainError::validation(
                "name",
                format!("must be at most {NAME_MAX_LEN} characters (got {len})"),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ItemName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ItemName::new(&value)
    }
}

impl From<ItemName> for String {
    fn from(name: ItemName) -> Self {
        name.0
    }
}

/// Free-text description of a revise item. Empty is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemDescription(String);

impl ItemDescription {
    /// Trim and validate a description.
    ///
    /// # Errors
    /// - `DomainError::Validation` on field `description` if longer than 1000 characters
    pub fn new(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        let len = trimmed.chars().count();

        if len > DESCRIPTION_MAX_LEN {
            return Err(DomainError::validation(
                "description",
                format!("must be at most {DESCRIPTION_MAX_LEN} characters (got {len})"),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ItemDescription {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ItemDescription::new(&value)
    }
}

impl From<ItemDescription> for String {
    fn from(description: ItemDescription) -> Self {
        description.0
    }
}
