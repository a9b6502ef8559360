//! Command Handlers module
//!
//! Command and query handlers that orchestrate business operations.
//! Each mutating handler is a thin adapter: it builds a closure that checks
//! ownership and calls one aggregate method, and hands it to
//! [`ReviseItemRepository::update`].

mod commands;
mod create_item_handler;
mod lifecycle_handler;
mod query_handler;
mod reminder_handler;
mod review_handler;
mod update_item_handler;


use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::ReviseItem;
use crate::domain::{DomainError, SharedClock};
use crate::error::{AppError, AppResult};
use crate::repository::ReviseItemRepository;

pub use commands::*;
pub use create_item_handler::CreateItemHandler;
pub use lifecycle_handler::LifecycleHandler;
pub use query_handler::ItemQueryHandler;
pub use reminder_handler::RegisterReminderHandler;
pub use review_handler::{ReviewItemHandler, ReviewItemResult};
pub use update_item_handler::UpdateItemHandler;

/// Run `change` on the stored item if `caller_id` owns it.
///
/// Ownership is checked before the aggregate method runs, so a non-owner
/// never observes a validation error for someone else's item. `now` is read
/// once the repository holds the item, so stamps follow commit order.
async fn mutate_owned<R, F>(
    repository: &R,
    clock: &SharedClock,
    item_id: Uuid,
    caller_id: Uuid,
    change: F,
) -> AppResult<ReviseItem>
where
    R: ReviseItemRepository,
    F: FnOnce(&mut ReviseItem, DateTime<Utc>) -> Result<(), DomainError> + Send + 'static,
{
    let clock = SharedClock::clone(clock);
    repository
        .update(item_id, move |mut item| {
            if !item.can_modify(caller_id) {
                tracing::warn!(%item_id, %caller_id, "Mutation rejected: caller is not the owner");
                return Err(AppError::Forbidden(format!(
                    "revise item {item_id} belongs to another user"
                )));
            }
            change(&mut item, clock.now())?;
            Ok(item)
        })
        .await
}
