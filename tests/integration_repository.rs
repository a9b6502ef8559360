//! PostgreSQL repository integration tests
//!
//! Need a migrated database: `DATABASE_URL=... cargo test -- --ignored`

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use revise_scheduler::aggregate::ReviseItem;
use revise_scheduler::domain::{IntervalTable, Pagination, ReminderUser};
use revise_scheduler::repository::{
    PgReviseItemRepository, PgUserDirectory, ReviseItemRepository, UserDirectory,
};
use revise_scheduler::{AppError, ErrorKind};
use uuid::Uuid;

mod common;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

fn new_item(owner: Uuid, created: DateTime<Utc>, next: DateTime<Utc>) -> ReviseItem {
    ReviseItem::create(
        Uuid::new_v4(),
        owner,
        "Interior mutability",
        "Cell, RefCell, Mutex",
        &["rust".to_string(), "std".to_string()],
        next,
        created,
    )
    .unwrap()
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_save_and_find_round_trip() {
    let pool = common::setup_test_db().await;
    let repo = PgReviseItemRepository::new(pool);
    let item = new_item(Uuid::new_v4(), at(1, 8), at(2, 8));

    repo.save(&item).await.unwrap();
    let found = repo.find_by_id(item.id()).await.unwrap().unwrap();

    assert_eq!(found, item);

    let err = repo.save(&item).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_persists_review_history() {
    let pool = common::setup_test_db().await;
    let repo = PgReviseItemRepository::new(pool);
    let item = new_item(Uuid::new_v4(), at(1, 8), at(2, 8));
    repo.save(&item).await.unwrap();
    let intervals = IntervalTable::default();

    for day in [2, 5] {
        let intervals = intervals.clone();
        repo.update(item.id(), move |mut current| {
            current.review(&intervals, at(day, 9))?;
            Ok(current)
        })
        .await
        .unwrap();
    }

    let stored = repo.find_by_id(item.id()).await.unwrap().unwrap();
    assert_eq!(stored.repetitions(), 2);
    assert_eq!(stored.revisions()[0].revised_at, at(2, 9));
    assert_eq!(stored.last_revised_at(), Some(at(5, 9)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_failed_closure_rolls_back() {
    let pool = common::setup_test_db().await;
    let repo = PgReviseItemRepository::new(pool);
    let item = new_item(Uuid::new_v4(), at(1, 8), at(2, 8));
    repo.save(&item).await.unwrap();

    let err = repo
        .update(item.id(), |mut current| {
            current.update_name("Never stored", at(1, 9))?;
            Err(AppError::Conflict("abort".to_string()))
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let stored = repo.find_by_id(item.id()).await.unwrap().unwrap();
    assert_eq!(stored.name(), "Interior mutability");

    let missing = repo
        .update(Uuid::new_v4(), |current| Ok(current))
        .await
        .unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_updates_do_not_lose_reviews() {
    let pool = common::setup_test_db().await;
    let repo = PgReviseItemRepository::new(pool);
    let item = new_item(Uuid::new_v4(), at(1, 8), at(2, 8));
    repo.save(&item).await.unwrap();

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            let repo = repo.clone();
            let id = item.id();
            tokio::spawn(async move {
                let intervals = IntervalTable::default();
                repo.update(id, move |mut current| {
                    current.review(&intervals, at(3, 8) + Duration::minutes(i))?;
                    Ok(current)
                })
                .await
            })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap().unwrap());
    }

    let stored = repo.find_by_id(item.id()).await.unwrap().unwrap();
    assert_eq!(stored.repetitions(), 4);

    // History reloads in append order, not timestamp order
    let last = results
        .into_iter()
        .find(|updated| updated.repetitions() == 4)
        .unwrap();
    assert_eq!(stored.revisions(), last.revisions());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_listing_and_due_queries() {
    let pool = common::setup_test_db().await;
    let repo = PgReviseItemRepository::new(pool.clone());
    let owner = Uuid::new_v4();

    let older = new_item(owner, at(1, 8), at(2, 8));
    let newer = new_item(owner, at(1, 9), at(20, 8));
    let deleted = new_item(owner, at(1, 10), at(2, 8));
    for item in [&older, &newer, &deleted] {
        repo.save(item).await.unwrap();
    }
    repo.update(deleted.id(), |mut current| {
        current.mark_as_deleted(at(1, 11));
        Ok(current)
    })
    .await
    .unwrap();

    let (page, total) = repo
        .list_by_owner(owner, Pagination::new(1, 10).unwrap())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(page[0].id(), newer.id());
    assert_eq!(page[1].id(), older.id());

    let due = repo.due_for_owner(owner, at(3, 8)).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].id(), older.id());

    // Reminder users are filtered by local time and by having due items
    let directory = PgUserDirectory::new(pool);
    let user = ReminderUser::new(owner, NaiveTime::from_hms_opt(10, 0, 0).unwrap(), 120).unwrap();
    directory.upsert_user(&user).await.unwrap();

    let now = at(3, 8) + Duration::seconds(30); // 10:00:30 at +02:00
    let users = directory
        .users_due_for_reminder(now - Duration::minutes(1), now)
        .await
        .unwrap();
    assert!(users.iter().any(|u| u.id == owner));

    let items = directory.due_items_for_user(owner, now).await.unwrap();
    assert_eq!(items.len(), 1);
}
