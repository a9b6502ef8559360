//! Command and query definitions
//!
//! Commands represent intentions to change the system state. Every command
//! that targets an existing item carries the caller's id so the handler can
//! check ownership before touching the aggregate.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Pagination;

// =========================================================================
// CreateItemCommand
// =========================================================================

/// Command to create a new revise item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemCommand {
    /// Generated by the handler when omitted
    pub item_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Defaults to `now + intervals.next(0)`
    pub next_revision_at: Option<DateTime<Utc>>,
}

impl CreateItemCommand {
    pub fn new(owner_id: Uuid, name: String) -> Self {
        Self {
            item_id: None,
            owner_id,
            name,
            description: String::new(),
            tags: Vec::new(),
            next_revision_at: None,
        }
    }

    pub fn with_id(mut self, item_id: Uuid) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_next_revision_at(mut self, next_revision_at: DateTime<Utc>) -> Self {
        self.next_revision_at = Some(next_revision_at);
        self
    }
}

// =========================================================================
// UpdateItemCommand
// =========================================================================

/// A single field-level change to an existing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ItemChange {
    Name(String),
    Description(String),
    AddTags(Vec<String>),
    RemoveTags(Vec<String>),
    /// Manual reschedule
    NextRevisionAt(DateTime<Utc>),
}

/// Command to change one aspect of an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemCommand {
    pub item_id: Uuid,
    pub caller_id: Uuid,
    pub change: ItemChange,
}

impl UpdateItemCommand {
    pub fn new(item_id: Uuid, caller_id: Uuid, change: ItemChange) -> Self {
        Self {
            item_id,
            caller_id,
            change,
        }
    }
}

// =========================================================================
// Lifecycle commands
// =========================================================================

/// Soft delete or restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Delete,
    Restore,
}

/// Command to soft-delete or restore an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleCommand {
    pub item_id: Uuid,
    pub caller_id: Uuid,
    pub action: LifecycleAction,
}

impl LifecycleCommand {
    pub fn delete(item_id: Uuid, caller_id: Uuid) -> Self {
        Self {
            item_id,
            caller_id,
            action: LifecycleAction::Delete,
        }
    }

    pub fn restore(item_id: Uuid, caller_id: Uuid) -> Self {
        Self {
            item_id,
            caller_id,
            action: LifecycleAction::Restore,
        }
    }
}

/// Command to record a completed review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItemCommand {
    pub item_id: Uuid,
    pub caller_id: Uuid,
}

impl ReviewItemCommand {
    pub fn new(item_id: Uuid, caller_id: Uuid) -> Self {
        Self { item_id, caller_id }
    }
}

/// Command to register or replace the caller's daily reminder time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterReminderCommand {
    pub user_id: Uuid,
    pub reminder_time: NaiveTime,
    pub utc_offset_minutes: i32,
    pub display_name: Option<String>,
}

// =========================================================================
// Queries
// =========================================================================

/// Fetch one item on behalf of `caller_id`
#[derive(Debug, Clone, Copy)]
pub struct GetItemQuery {
    pub item_id: Uuid,
    pub caller_id: Uuid,
}

/// Page through the active items of `owner_id`
#[derive(Debug, Clone, Copy)]
pub struct ListItemsQuery {
    pub owner_id: Uuid,
    pub pagination: Pagination,
}
