//! PostgreSQL adapters
//!
//! `update` runs inside one transaction holding a row lock
//! (`SELECT ... FOR UPDATE`), so concurrent updates on the same item are
//! serialized by the database. Dropping the future before commit rolls the
//! transaction back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::aggregate::{ReviseItem, ReviseItemRecord};
use crate::domain::{DomainError, ItemDescription, ItemName, Pagination, ReminderUser, Revision, TagSet};
use crate::error::{AppError, AppResult};

use super::{ReviseItemRepository, UserDirectory};

/// How long `update` waits for a row lock before reporting a conflict
const LOCK_TIMEOUT: &str = "5s";

const ITEM_COLUMNS: &str = "id, owner_id, name, description, tags, created_at, updated_at, \
                            deleted_at, last_revised_at, next_revision_at";

/// Row of the `revise_items` table
#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
    last_revised_at: Option<DateTime<Utc>>,
    next_revision_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self, revisions: Vec<Revision>) -> AppResult<ReviseItem> {
        let corrupt = |e: DomainError| AppError::Unknown(format!("corrupt revise item {}: {}", self.id, e));

        let name = ItemName::new(&self.name).map_err(corrupt)?;
        let description = ItemDescription::new(&self.description).map_err(corrupt)?;

        Ok(ReviseItem::from_record(ReviseItemRecord {
            id: self.id,
            owner_id: self.owner_id,
            name,
            description,
            tags: self.tags.iter().collect::<TagSet>(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            last_revised_at: self.last_revised_at,
            next_revision_at: self.next_revision_at,
            revisions,
        }))
    }
}

/// Map a driver error onto the application taxonomy
pub(crate) fn storage_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return AppError::AlreadyExists(db_err.message().to_string()),
            // serialization_failure, deadlock_detected, lock_not_available
            Some("40001") | Some("40P01") | Some("55P03") => {
                return AppError::Conflict(db_err.message().to_string())
            }
            _ => {}
        }
    }

    if matches!(err, sqlx::Error::PoolTimedOut) {
        return AppError::Conflict("database pool exhausted".to_string());
    }

    tracing::error!("Storage error: {:?}", err);
    AppError::Unknown(format!("storage error: {err}"))
}

/// Group rows by item id, preserving row order within each item
fn attach_revisions(
    rows: Vec<ItemRow>,
    mut revisions: Vec<Revision>,
) -> AppResult<Vec<ReviseItem>> {
    rows.into_iter()
        .map(|row| {
            let (own, rest): (Vec<_>, Vec<_>) = revisions
                .drain(..)
                .partition(|revision| revision.revise_item_id == row.id);
            revisions = rest;
            row.into_item(own)
        })
        .collect()
}

// =========================================================================
// PgReviseItemRepository
// =========================================================================

/// ReviseItem repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgReviseItemRepository {
    pool: PgPool,
}

impl PgReviseItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_revisions(&self, item_ids: &[Uuid]) -> AppResult<Vec<Revision>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, Uuid, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, revise_item_id, revised_at
            FROM revisions
            WHERE revise_item_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, revise_item_id, revised_at)| Revision {
                id,
                revise_item_id,
                revised_at,
            })
            .collect())
    }

    async fn hydrate(&self, rows: Vec<ItemRow>) -> AppResult<Vec<ReviseItem>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let revisions = self.load_revisions(&ids).await?;
        attach_revisions(rows, revisions)
    }

    /// Load one item inside a transaction, taking its row lock
    async fn lock_item(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<Option<ReviseItem>> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM revise_items WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(storage_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let revisions: Vec<(Uuid, Uuid, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, revise_item_id, revised_at
            FROM revisions
            WHERE revise_item_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await
        .map_err(storage_error)?;

        let revisions = revisions
            .into_iter()
            .map(|(id, revise_item_id, revised_at)| Revision {
                id,
                revise_item_id,
                revised_at,
            })
            .collect();

        row.into_item(revisions).map(Some)
    }

    async fn insert_revisions(
        tx: &mut Transaction<'_, Postgres>,
        revisions: &[Revision],
    ) -> AppResult<()> {
        for revision in revisions {
            sqlx::query(
                r#"
                INSERT INTO revisions (id, revise_item_id, revised_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(revision.id)
            .bind(revision.revise_item_id)
            .bind(revision.revised_at)
            .execute(&mut **tx)
            .await
            .map_err(storage_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ReviseItemRepository for PgReviseItemRepository {
    async fn save(&self, item: &ReviseItem) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO revise_items (
                id, owner_id, name, description, tags, created_at, updated_at,
                deleted_at, last_revised_at, next_revision_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id())
        .bind(item.owner_id())
        .bind(item.name())
        .bind(item.description())
        .bind(item.tags().to_vec())
        .bind(item.created_at())
        .bind(item.updated_at())
        .bind(item.deleted_at())
        .bind(item.last_revised_at())
        .bind(item.next_revision_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| match storage_error(e) {
            AppError::AlreadyExists(_) => AppError::AlreadyExists(format!("revise item {}", item.id())),
            other => other,
        })?;

        Self::insert_revisions(&mut tx, item.revisions()).await?;

        tx.commit().await.map_err(storage_error)?;

        tracing::debug!(item_id = %item.id(), "Revise item saved");
        Ok(())
    }

    async fn update<F>(&self, id: Uuid, mutate: F) -> AppResult<ReviseItem>
    where
        F: FnOnce(ReviseItem) -> AppResult<ReviseItem> + Send + 'static,
    {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query(&format!("SET LOCAL lock_timeout = '{LOCK_TIMEOUT}'"))
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let current = Self::lock_item(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("revise item {id}")))?;
        let persisted_revisions = current.repetitions();

        // A failing closure drops `tx`, which rolls back and releases the lock
        let updated = mutate(current)?;

        sqlx::query(
            r#"
            UPDATE revise_items
            SET name = $2,
                description = $3,
                tags = $4,
                updated_at = $5,
                deleted_at = $6,
                last_revised_at = $7,
                next_revision_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(updated.name())
        .bind(updated.description())
        .bind(updated.tags().to_vec())
        .bind(updated.updated_at())
        .bind(updated.deleted_at())
        .bind(updated.last_revised_at())
        .bind(updated.next_revision_at())
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        // Review history is append-only
        let new_revisions = updated
            .revisions()
            .get(persisted_revisions..)
            .unwrap_or_default();
        Self::insert_revisions(&mut tx, new_revisions).await?;

        tx.commit().await.map_err(storage_error)?;

        Ok(updated)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ReviseItem>> {
        let row: Option<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM revise_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        match row {
            Some(row) => {
                let revisions = self.load_revisions(&[row.id]).await?;
                row.into_item(revisions).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<(Vec<ReviseItem>, u64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM revise_items
            WHERE owner_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM revise_items \
             WHERE owner_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id ASC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(owner_id)
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let items = self.hydrate(rows).await?;
        Ok((items, total.max(0) as u64))
    }

    async fn due_for_owner(&self, owner_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<ReviseItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM revise_items \
             WHERE owner_id = $1 AND deleted_at IS NULL AND next_revision_at <= $2 \
             ORDER BY next_revision_at ASC, id ASC"
        ))
        .bind(owner_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        self.hydrate(rows).await
    }
}

// =========================================================================
// PgUserDirectory
// =========================================================================

/// Reminder users backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
    items: PgReviseItemRepository,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        let items = PgReviseItemRepository::new(pool.clone());
        Self { pool, items }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn upsert_user(&self, user: &ReminderUser) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, display_name, reminder_time, utc_offset_minutes, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (id) DO UPDATE
            SET display_name = EXCLUDED.display_name,
                reminder_time = EXCLUDED.reminder_time,
                utc_offset_minutes = EXCLUDED.utc_offset_minutes,
                updated_at = NOW()
            "#,
        )
        .bind(user.id)
        .bind(&user.display_name)
        .bind(user.reminder_time)
        .bind(user.utc_offset_minutes)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn users_due_for_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<Vec<ReminderUser>> {
        // Only users with at least one item due at `to`; the time-of-day range
        // is evaluated per user offset below.
        let rows: Vec<(Uuid, Option<String>, NaiveTime, i32)> = sqlx::query_as(
            r#"
            SELECT u.id, u.display_name, u.reminder_time, u.utc_offset_minutes
            FROM users u
            WHERE EXISTS (
                SELECT 1 FROM revise_items i
                WHERE i.owner_id = u.id
                  AND i.deleted_at IS NULL
                  AND i.next_revision_at <= $1
            )
            ORDER BY u.id
            "#,
        )
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, display_name, reminder_time, utc_offset_minutes)| ReminderUser {
                id,
                display_name,
                reminder_time,
                utc_offset_minutes,
            })
            .filter(|user| user.is_reminder_due(from, to))
            .collect())
    }

    async fn due_items_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Vec<ReviseItem>> {
        self.items.due_for_owner(user_id, now).await
    }
}
