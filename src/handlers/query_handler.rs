//! Item Query Handler
//!
//! Read side: single-item lookup and paged listing of the caller's items.

use crate::aggregate::ReviseItem;
use crate::domain::Page;
use crate::error::{AppError, AppResult};
use crate::repository::ReviseItemRepository;

use super::{GetItemQuery, ListItemsQuery};

/// Handler for item queries
pub struct ItemQueryHandler<R> {
    repository: R,
}

impl<R: ReviseItemRepository> ItemQueryHandler<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Fetch one active item owned by the caller
    pub async fn get(&self, query: GetItemQuery) -> AppResult<ReviseItem> {
        let item = self
            .repository
            .find_by_id(query.item_id)
            .await?
            .filter(|item| !item.is_deleted())
            .ok_or_else(|| AppError::NotFound(format!("revise item {}", query.item_id)))?;

        if !item.can_modify(query.caller_id) {
            return Err(AppError::Forbidden(format!(
                "revise item {} belongs to another user",
                query.item_id
            )));
        }

        Ok(item)
    }

    /// List the owner's active items, newest first
    pub async fn list(&self, query: ListItemsQuery) -> AppResult<Page<ReviseItem>> {
        let (items, total) = self
            .repository
            .list_by_owner(query.owner_id, query.pagination)
            .await?;

        Ok(Page::new(items, total, query.pagination))
    }
}
