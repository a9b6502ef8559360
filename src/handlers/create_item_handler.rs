//! Create Item Handler

use std::sync::Arc;

use uuid::Uuid;

use crate::aggregate::ReviseItem;
use crate::domain::{IntervalTable, SharedClock};
use crate::error::AppResult;
use crate::repository::ReviseItemRepository;

use super::CreateItemCommand;

/// Handler for item creation
pub struct CreateItemHandler<R> {
    repository: R,
    clock: SharedClock,
    intervals: Arc<IntervalTable>,
}

impl<R: ReviseItemRepository> CreateItemHandler<R> {
    pub fn new(repository: R, clock: SharedClock, intervals: Arc<IntervalTable>) -> Self {
        Self {
            repository,
            clock,
            intervals,
        }
    }

    /// Execute the create item command
    pub async fn execute(&self, command: CreateItemCommand) -> AppResult<ReviseItem> {
        let now = self.clock.now();
        let item_id = command.item_id.unwrap_or_else(Uuid::new_v4);
        let next_revision_at = command
            .next_revision_at
            .unwrap_or_else(|| now + self.intervals.next(0));

        let item = ReviseItem::create(
            item_id,
            command.owner_id,
            &command.name,
            &command.description,
            &command.tags,
            next_revision_at,
            now,
        )?;

        self.repository.save(&item).await?;

        tracing::info!(
            item_id = %item.id(),
            owner_id = %item.owner_id(),
            next_revision_at = %item.next_revision_at(),
            "Revise item created"
        );

        Ok(item)
    }
}
