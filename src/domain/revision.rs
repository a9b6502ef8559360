//! Review events
//!
//! A revision is an immutable fact: the owner reviewed an item at some instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed review of a revise item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: Uuid,
    pub revise_item_id: Uuid,
    pub revised_at: DateTime<Utc>,
}

impl Revision {
    pub fn new(revise_item_id: Uuid, revised_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            revise_item_id,
            revised_at,
        }
    }
}
