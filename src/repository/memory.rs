//! In-memory adapters
//!
//! Used when no database is configured, and by the test suites. Each item sits
//! behind its own async mutex; `update` holds that mutex across the closure so
//! updates on one id are serialized while other ids proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::aggregate::ReviseItem;
use crate::domain::{Pagination, ReminderUser};
use crate::error::{AppError, AppResult};

use super::{ReviseItemRepository, UserDirectory};

type Slot = Arc<Mutex<ReviseItem>>;

/// ReviseItem repository held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryReviseItemRepository {
    items: Arc<RwLock<HashMap<Uuid, Slot>>>,
}

impl InMemoryReviseItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: Uuid) -> Option<Slot> {
        self.items.read().await.get(&id).cloned()
    }

    /// Snapshot of every stored item
    async fn snapshot(&self) -> Vec<ReviseItem> {
        let slots: Vec<Slot> = self.items.read().await.values().cloned().collect();
        let mut items = Vec::with_capacity(slots.len());
        for slot in slots {
            items.push(slot.lock().await.clone());
        }
        items
    }
}

#[async_trait]
impl ReviseItemRepository for InMemoryReviseItemRepository {
    async fn save(&self, item: &ReviseItem) -> AppResult<()> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.id()) {
            return Err(AppError::AlreadyExists(format!("revise item {}", item.id())));
        }
        items.insert(item.id(), Arc::new(Mutex::new(item.clone())));
        Ok(())
    }

    async fn update<F>(&self, id: Uuid, mutate: F) -> AppResult<ReviseItem>
    where
        F: FnOnce(ReviseItem) -> AppResult<ReviseItem> + Send + 'static,
    {
        let slot = self
            .slot(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("revise item {id}")))?;

        let mut current = slot.lock().await;
        let updated = mutate(current.clone())?;
        *current = updated.clone();

        Ok(updated)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReviseItem>> {
        match self.slot(id).await {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<ReviseItem>, u64)> {
        let mut owned: Vec<ReviseItem> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|item| item.owner_id() == owner_id && !item.is_deleted())
            .collect();

        owned.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(&b.id()))
        });

        let total = owned.len() as u64;
        let page = owned
            .into_iter()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .collect();

        Ok((page, total))
    }

    async fn due_for_owner(&self, owner_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<ReviseItem>> {
        let mut due: Vec<ReviseItem> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|item| item.owner_id() == owner_id && item.is_due(now))
            .collect();

        due.sort_by(|a, b| {
            a.next_revision_at()
                .cmp(&b.next_revision_at())
                .then_with(|| a.id().cmp(&b.id()))
        });

        Ok(due)
    }
}

/// Reminder users held in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<Uuid, ReminderUser>>>,
    items: InMemoryReviseItemRepository,
}

impl InMemoryUserDirectory {
    /// Directory reading due items from `items`
    pub fn new(items: InMemoryReviseItemRepository) -> Self {
        Self {
            users: Arc::default(),
            items,
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn upsert_user(&self, user: &ReminderUser) -> AppResult<()> {
        self.users.write().await.insert(user.id, user.clone());
        Ok(())
    }

    async fn users_due_for_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderUser>> {
        let mut users: Vec<ReminderUser> = self
            .users
            .read()
            .await
            .values()
            .filter(|user| user.is_reminder_due(from, to))
            .cloned()
            .collect();
        users.sort_by_key(|user| user.id);
        Ok(users)
    }

    async fn due_items_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<ReviseItem>> {
        self.items.due_for_owner(user_id, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    fn item(owner_id: Uuid, created_at: DateTime<Utc>, next: DateTime<Utc>) -> ReviseItem {
        ReviseItem::create(
            Uuid::new_v4(),
            owner_id,
            "Ownership rules",
            "",
            &[],
            next,
            created_at,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_rejects_duplicate_id() {
        let repo = InMemoryReviseItemRepository::new();
        let item = item(Uuid::new_v4(), at(8, 0), at(9, 0));

        repo.save(&item).await.unwrap();
        let err = repo.save(&item).await.unwrap_err();

        assert!(matches!(err, AppError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_id_does_not_call_closure() {
        let repo = InMemoryReviseItemRepository::new();

        let err = repo
            .update(Uuid::new_v4(), |_| panic!("closure must not run"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_closure_persists_nothing() {
        let repo = InMemoryReviseItemRepository::new();
        let item = item(Uuid::new_v4(), at(8, 0), at(9, 0));
        repo.save(&item).await.unwrap();

        let err = repo
            .update(item.id(), move |mut current| {
                current.update_name("Renamed", at(8, 30))?;
                Err(AppError::Conflict("abort".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        let stored = repo.find_by_id(item.id()).await.unwrap().unwrap();
        assert_eq!(stored.name(), "Ownership rules");
    }

    #[tokio::test]
    async fn test_list_by_owner_newest_first_and_paged() {
        let repo = InMemoryReviseItemRepository::new();
        let owner = Uuid::new_v4();
        let older = item(owner, at(8, 0), at(10, 0));
        let newer = item(owner, at(9, 0), at(10, 0));
        let foreign = item(Uuid::new_v4(), at(9, 30), at(10, 0));
        for i in [&older, &newer, &foreign] {
            repo.save(i).await.unwrap();
        }

        let (first_page, total) = repo
            .list_by_owner(owner, Pagination::new(1, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(first_page[0].id(), newer.id());

        let (second_page, _) = repo
            .list_by_owner(owner, Pagination::new(2, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(second_page[0].id(), older.id());
    }

    #[tokio::test]
    async fn test_due_for_owner_skips_deleted_and_future() {
        let repo = InMemoryReviseItemRepository::new();
        let owner = Uuid::new_v4();
        let due = item(owner, at(8, 0), at(9, 0));
        let later = item(owner, at(8, 0), at(23, 0));
        let deleted = item(owner, at(8, 0), at(9, 0));
        for i in [&due, &later, &deleted] {
            repo.save(i).await.unwrap();
        }
        repo.update(deleted.id(), |mut current| {
            current.mark_as_deleted(at(8, 10));
            Ok(current)
        })
        .await
        .unwrap();

        let found = repo.due_for_owner(owner, at(12, 0)).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), due.id());
    }

    #[tokio::test]
    async fn test_directory_filters_by_reminder_window() {
        let items = InMemoryReviseItemRepository::new();
        let directory = InMemoryUserDirectory::new(items);
        let morning = ReminderUser::new(Uuid::new_v4(), NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 0)
            .unwrap();
        let evening = ReminderUser::new(Uuid::new_v4(), NaiveTime::from_hms_opt(21, 0, 0).unwrap(), 0)
            .unwrap();
        directory.upsert_user(&morning).await.unwrap();
        directory.upsert_user(&evening).await.unwrap();

        let due = directory
            .users_due_for_reminder(at(8, 59) + Duration::seconds(30), at(9, 0) + Duration::seconds(30))
            .await
            .unwrap();

        assert_eq!(due, vec![morning]);
    }
}
