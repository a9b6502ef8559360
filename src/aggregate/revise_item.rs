//! ReviseItem Aggregate
//!
//! The revisable unit: what the user studies, who owns it, and when it is due
//! again. Every method is a pure in-memory transition; persistence is the
//! repository's job and "now" is always passed in by the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    DomainError, IntervalTable, ItemDescription, ItemName, Revision, TagSet,
};

/// Soft-delete state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ItemStatus {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl ItemStatus {
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            ItemStatus::Active => None,
            ItemStatus::Deleted { at } => Some(*at),
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Persisted shape of a revise item, used to rehydrate the aggregate.
#[derive(Debug, Clone)]
pub struct ReviseItemRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: ItemName,
    pub description: ItemDescription,
    pub tags: TagSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub last_revised_at: Option<DateTime<Utc>>,
    pub next_revision_at: DateTime<Utc>,
    pub revisions: Vec<Revision>,
}

/// ReviseItem Aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviseItem {
    /// Unique item ID
    id: Uuid,

    /// Owning user
    owner_id: Uuid,

    name: ItemName,

    description: ItemDescription,

    tags: TagSet,

    /// Active or soft-deleted
    status: ItemStatus,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,

    /// Most recent review, `None` if never reviewed
    last_revised_at: Option<DateTime<Utc>>,

    /// The item is due at or after this instant
    next_revision_at: DateTime<Utc>,

    /// Append-only review history
    revisions: Vec<Revision>,
}

impl ReviseItem {
    // =========================================================================
    // ReviseItem::create()
    // =========================================================================

    /// Create a new revise item.
    ///
    /// Fields are checked in order (name, description, tags, next revision) and
    /// the error names the first one that fails.
    pub fn create(
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        description: &str,
        tags: &[String],
        next_revision_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = ItemName::new(name)?;
        let description = ItemDescription::new(description)?;
        let tags: TagSet = tags.iter().collect();
        tags.validate()?;
        ensure_future(next_revision_at, now)?;

        Ok(Self {
            id,
            owner_id,
            name,
            description,
            tags,
            status: ItemStatus::Active,
            created_at: now,
            updated_at: now,
            last_revised_at: None,
            next_revision_at,
            revisions: Vec::new(),
        })
    }

    /// Rebuild an aggregate from storage without re-running validation.
    pub fn from_record(record: ReviseItemRecord) -> Self {
        let status = match record.deleted_at {
            Some(at) => ItemStatus::Deleted { at },
            None => ItemStatus::Active,
        };

        Self {
            id: record.id,
            owner_id: record.owner_id,
            name: record.name,
            description: record.description,
            tags: record.tags,
            status,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_revised_at: record.last_revised_at,
            next_revision_at: record.next_revision_at,
            revisions: record.revisions,
        }
    }

    // =========================================================================
    // Field mutations
    // =========================================================================

    pub fn update_name(&mut self, name: &str, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.name = ItemName::new(name)?;
        self.touch(now);
        Ok(())
    }

    pub fn update_description(
        &mut self,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.description = ItemDescription::new(description)?;
        self.touch(now);
        Ok(())
    }

    /// Add tags. The set is left untouched if the result would be invalid.
    pub fn add_tags(&mut self, tags: &[String], now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_active()?;
        let mut candidate = self.tags.clone();
        candidate.add_many(tags);
        candidate.validate()?;
        self.tags = candidate;
        self.touch(now);
        Ok(())
    }

    pub fn remove_tags(&mut self, tags: &[String], now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_active()?;
        let mut candidate = self.tags.clone();
        candidate.remove_many(tags);
        candidate.validate()?;
        self.tags = candidate;
        self.touch(now);
        Ok(())
    }

    pub fn update_next_revision_at(
        &mut self,
        next_revision_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;
        ensure_future(next_revision_at, now)?;
        self.next_revision_at = next_revision_at;
        self.touch(now);
        Ok(())
    }

    // =========================================================================
    // ReviseItem::review()
    // =========================================================================

    /// Record a review at `now` and schedule the next one.
    ///
    /// The interval slot is the repetition count after this review is
    /// appended, so the first review uses slot 1.
    pub fn review(
        &mut self,
        intervals: &IntervalTable,
        now: DateTime<Utc>,
    ) -> Result<&Revision, DomainError> {
        self.ensure_active()?;

        let next_revision_at = now + intervals.next(self.revisions.len() + 1);
        ensure_future(next_revision_at, now)?;

        self.revisions.push(Revision::new(self.id, now));
        self.last_revised_at = Some(now);
        self.next_revision_at = next_revision_at;
        self.touch(now);

        Ok(&self.revisions[self.revisions.len() - 1])
    }

    // =========================================================================
    // Soft delete
    // =========================================================================

    /// Soft-delete the item. No-op if already deleted.
    pub fn mark_as_deleted(&mut self, now: DateTime<Utc>) {
        if self.is_deleted() {
            return;
        }
        self.status = ItemStatus::Deleted { at: now };
        self.touch(now);
    }

    /// Undo a soft delete. No-op if already active.
    pub fn restore(&mut self, now: DateTime<Utc>) {
        if !self.is_deleted() {
            return;
        }
        self.status = ItemStatus::Active;
        self.touch(now);
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    pub fn can_modify(&self, caller_id: Uuid) -> bool {
        caller_id == self.owner_id
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self.status, ItemStatus::Deleted { .. })
    }

    /// Active and scheduled at or before `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_deleted() && self.next_revision_at <= now
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        match self.status {
            ItemStatus::Active => Ok(()),
            ItemStatus::Deleted { .. } => Err(DomainError::ItemDeleted(self.id)),
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.status.deleted_at()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn last_revised_at(&self) -> Option<DateTime<Utc>> {
        self.last_revised_at
    }

    pub fn next_revision_at(&self) -> DateTime<Utc> {
        self.next_revision_at
    }

    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    /// Number of completed reviews
    pub fn repetitions(&self) -> usize {
        self.revisions.len()
    }
}

fn ensure_future(at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), DomainError> {
    if at <= now {
        return Err(DomainError::validation(
            "next_revision_at",
            "must be in the future",
        ));
    }
    Ok(())
}

// =========================================================================
// Unit tests
// =========================================================================
