//! Lifecycle Handler
//!
//! Soft delete and restore. Both are no-ops when the item is already in the
//! requested state.

use crate::aggregate::ReviseItem;
use crate::domain::SharedClock;
use crate::error::AppResult;
use crate::repository::ReviseItemRepository;

use super::{mutate_owned, LifecycleAction, LifecycleCommand};

/// Handler for soft delete and restore
pub struct LifecycleHandler<R> {
    repository: R,
    clock: SharedClock,
}

impl<R: ReviseItemRepository> LifecycleHandler<R> {
    pub fn new(repository: R, clock: SharedClock) -> Self {
        Self { repository, clock }
    }

    pub async fn execute(&self, command: LifecycleCommand) -> AppResult<ReviseItem> {
        let action = command.action;

        let item = mutate_owned(
            &self.repository,
            &self.clock,
            command.item_id,
            command.caller_id,
            move |item, now| {
                match action {
                    LifecycleAction::Delete => item.mark_as_deleted(now),
                    LifecycleAction::Restore => item.restore(now),
                }
                Ok(())
            },
        )
        .await?;

        tracing::info!(item_id = %command.item_id, action = ?action, "Revise item lifecycle changed");

        Ok(item)
    }
}
