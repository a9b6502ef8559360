//! Tag set
//!
//! Normalized collection of short labels attached to a revise item.
//! Members are stored trimmed and deduplicated; ordering is not significant.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::DomainError;

/// Maximum number of tags on one item
pub const MAX_TAGS: usize = 10;

/// Maximum tag length (characters, after trimming)
pub const TAG_MAX_LEN: usize = 255;

/// Set of tags.
///
/// Adding a tag that is already present (after trimming) and removing an
/// absent tag are both no-ops. Bounds are not enforced on insertion; callers
/// run [`TagSet::validate`] on a candidate set before committing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tag: &str) {
        self.0.insert(tag.trim().to_string());
    }

    pub fn add_many<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.add(tag.as_ref());
        }
    }

    pub fn remove(&mut self, tag: &str) {
        self.0.remove(tag.trim());
    }

    pub fn remove_many<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.remove(tag.as_ref());
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag.trim())
    }

    /// Re-trim every member and collapse duplicates.
    pub fn normalize(&mut self) {
        let members = std::mem::take(&mut self.0);
        self.0 = members.into_iter().map(|t| t.trim().to_string()).collect();
    }

    /// Check set size and member lengths.
    ///
    /// # Errors
    /// - `DomainError::Validation` on field `tags`
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.len() > MAX_TAGS {
            return Err(DomainError::validation(
                "tags",
                format!("at most {MAX_TAGS} tags allowed (got {})", self.0.len()),
            ));
        }

        for tag in &self.0 {
            let len = tag.trim().chars().count();
            if len == 0 {
                return Err(DomainError::validation("tags", "tag must not be empty"));
            }
            if len > TAG_MAX_LEN {
                return Err(DomainError::validation(
                    "tags",
                    format!("tag must be at most {TAG_MAX_LEN} characters (got {len})"),
                ));
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        set.add_many(iter);
        set
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Self {
        tags.0.into_iter().collect()
    }
}
