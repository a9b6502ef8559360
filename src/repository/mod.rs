//! Repository module
//!
//! Persistence ports for revise items and reminder users, with PostgreSQL and
//! in-memory adapters.
//!
//! # Update-by-closure
//!
//! [`ReviseItemRepository::update`] is the only way to change a stored item.
//! The adapter loads the current state inside one unit of work, hands it to
//! the `mutate` closure, and commits the returned state only if the closure
//! succeeds. Two updates on the same id never interleave; updates on
//! different ids never wait on each other.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::aggregate::ReviseItem;
use crate::domain::{Pagination, ReminderUser};
use crate::error::AppResult;

pub use memory::{InMemoryReviseItemRepository, InMemoryUserDirectory};
pub use postgres::{PgReviseItemRepository, PgUserDirectory};

/// Repository port for the ReviseItem aggregate
#[async_trait]
pub trait ReviseItemRepository: Send + Sync {
    /// Persist a brand-new item.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    async fn save(&self, item: &ReviseItem) -> AppResult<()>;

    /// Atomically load, mutate and persist one item.
    ///
    /// Returns the committed state.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the id is unknown (`mutate` is not called)
    /// - whatever `mutate` returns, with nothing persisted
    /// - `Conflict` if the store could not lock the item in time
    async fn update<F>(&self, id: Uuid, mutate: F) -> AppResult<ReviseItem>
    where
        F: FnOnce(ReviseItem) -> AppResult<ReviseItem> + Send + 'static;

    /// Find an item by id, deleted or not.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReviseItem>>;

    /// Active items of one owner, newest first, plus the total count.
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<ReviseItem>, u64)>;

    /// Active items of one owner due at `now`, earliest first.
    async fn due_for_owner(&self, owner_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<ReviseItem>>;
}

/// Source of reminder users and their due items
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register or replace a user's reminder settings.
    async fn upsert_user(&self, user: &ReminderUser) -> AppResult<()>;

    /// Users whose local reminder time falls in `[from, to)`.
    async fn users_due_for_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderUser>>;

    /// Active items owned by `user_id` that are due at `now`.
    async fn due_items_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<ReviseItem>>;
}
