//! Update Item Handler
//!
//! Name, description, tag and reschedule changes. Each change is one aggregate
//! call inside the repository's update closure.

use crate::aggregate::ReviseItem;
use crate::domain::SharedClock;
use crate::error::AppResult;
use crate::repository::ReviseItemRepository;

use super::{mutate_owned, ItemChange, UpdateItemCommand};

/// Handler for field-level item changes
pub struct UpdateItemHandler<R> {
    repository: R,
    clock: SharedClock,
}

impl<R: ReviseItemRepository> UpdateItemHandler<R> {
    pub fn new(repository: R, clock: SharedClock) -> Self {
        Self { repository, clock }
    }

    /// Execute the update item command
    pub async fn execute(&self, command: UpdateItemCommand) -> AppResult<ReviseItem> {
        let UpdateItemCommand {
            item_id,
            caller_id,
            change,
        } = command;
        let kind = change_kind(&change);

        let item = mutate_owned(
            &self.repository,
            &self.clock,
            item_id,
            caller_id,
            move |item, now| match change {
                ItemChange::Name(name) => item.update_name(&name, now),
                ItemChange::Description(description) => item.update_description(&description, now),
                ItemChange::AddTags(tags) => item.add_tags(&tags, now),
                ItemChange::RemoveTags(tags) => item.remove_tags(&tags, now),
                ItemChange::NextRevisionAt(at) => item.update_next_revision_at(at, now),
            },
        )
        .await?;

        tracing::info!(item_id = %item_id, change = kind, "Revise item updated");

        Ok(item)
    }
}

fn change_kind(change: &ItemChange) -> &'static str {
    match change {
        ItemChange::Name(_) => "name",
        ItemChange::Description(_) => "description",
        ItemChange::AddTags(_) => "add_tags",
        ItemChange::RemoveTags(_) => "remove_tags",
        ItemChange::NextRevisionAt(_) => "next_revision_at",
    }
}
