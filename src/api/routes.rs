//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::ReviseItem;
use crate::domain::pagination::DEFAULT_PAGE_SIZE;
use crate::domain::{IntervalTable, Page, Pagination, ReminderUser, Revision, SharedClock};
use crate::error::AppError;
use crate::handlers::{
    CreateItemCommand, CreateItemHandler, GetItemQuery, ItemChange, ItemQueryHandler,
    LifecycleCommand, LifecycleHandler, ListItemsQuery, RegisterReminderCommand,
    RegisterReminderHandler, ReviewItemCommand, ReviewItemHandler, UpdateItemCommand,
    UpdateItemHandler,
};
use crate::repository::{ReviseItemRepository, UserDirectory};

use super::middleware::RequestUser;

// =========================================================================
// Shared state
// =========================================================================

/// Dependencies shared by every request
pub struct AppState<R> {
    pub items: R,
    pub users: Arc<dyn UserDirectory>,
    pub clock: SharedClock,
    pub intervals: Arc<IntervalTable>,
}

impl<R: Clone> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            users: Arc::clone(&self.users),
            clock: Arc::clone(&self.clock),
            intervals: Arc::clone(&self.intervals),
        }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub next_revision_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateNameRequest {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagsRequest {
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub next_revision_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub reminder_time: NaiveTime,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemsParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    pub last_revised_at: Option<DateTime<Utc>>,
    pub next_revision_at: DateTime<Utc>,
    pub repetitions: usize,
    pub revisions: Vec<Revision>,
}

impl From<ReviseItem> for ItemResponse {
    fn from(item: ReviseItem) -> Self {
        Self {
            id: item.id(),
            owner_id: item.owner_id(),
            name: item.name().to_string(),
            description: item.description().to_string(),
            tags: item.tags().to_vec(),
            created_at: item.created_at(),
            updated_at: item.updated_at(),
            deleted_at: item.deleted_at(),
            last_revised_at: item.last_revised_at(),
            next_revision_at: item.next_revision_at(),
            repetitions: item.repetitions(),
            revisions: item.revisions().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub item: ItemResponse,
    pub revision: Revision,
}

/// Build the item routes
pub fn create_router<R>() -> Router<AppState<R>>
where
    R: ReviseItemRepository + Clone + 'static,
{
    Router::new()
        .route("/items", post(create_item::<R>).get(list_items::<R>))
        .route("/items/:item_id", get(get_item::<R>).delete(delete_item::<R>))
        .route("/items/:item_id/name", patch(update_name::<R>))
        .route("/items/:item_id/description", patch(update_description::<R>))
        .route(
            "/items/:item_id/tags",
            post(add_tags::<R>).delete(remove_tags::<R>),
        )
        .route("/items/:item_id/next-revision", put(reschedule::<R>))
        .route("/items/:item_id/review", post(review_item::<R>))
        .route("/items/:item_id/restore", post(restore_item::<R>))
        .route("/users/me/reminder", put(register_reminder::<R>))
}

// =========================================================================
// POST /items
// =========================================================================

/// Create a new revise item owned by the caller
async fn create_item<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    let handler = CreateItemHandler::new(state.items, state.clock, state.intervals);

    let mut command = CreateItemCommand::new(caller.user_id, request.name)
        .with_description(request.description)
        .with_tags(request.tags);
    if let Some(id) = request.id {
        command = command.with_id(id);
    }
    if let Some(at) = request.next_revision_at {
        command = command.with_next_revision_at(at);
    }

    let item = handler.execute(command).await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

// =========================================================================
// GET /items
// =========================================================================

/// List the caller's active items
async fn list_items<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<Page<ItemResponse>>, AppError> {
    let pagination = Pagination::new(
        params.page.unwrap_or(1),
        params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
    )?;

    let page = ItemQueryHandler::new(state.items)
        .list(ListItemsQuery {
            owner_id: caller.user_id,
            pagination,
        })
        .await?;

    Ok(Json(page.map(ItemResponse::from)))
}

// =========================================================================
// GET /items/:item_id
// =========================================================================

async fn get_item<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = ItemQueryHandler::new(state.items)
        .get(GetItemQuery {
            item_id,
            caller_id: caller.user_id,
        })
        .await?;

    Ok(Json(item.into()))
}

// =========================================================================
// Field updates
// =========================================================================

async fn apply_change<R: ReviseItemRepository + Clone>(
    state: AppState<R>,
    item_id: Uuid,
    caller: RequestUser,
    change: ItemChange,
) -> Result<Json<ItemResponse>, AppError> {
    let item = UpdateItemHandler::new(state.items, state.clock)
        .execute(UpdateItemCommand::new(item_id, caller.user_id, change))
        .await?;

    Ok(Json(item.into()))
}

async fn update_name<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateNameRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    apply_change(state, item_id, caller, ItemChange::Name(request.name)).await
}

async fn update_description<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateDescriptionRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    apply_change(
        state,
        item_id,
        caller,
        ItemChange::Description(request.description),
    )
    .await
}

async fn add_tags<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<TagsRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    apply_change(state, item_id, caller, ItemChange::AddTags(request.tags)).await
}

async fn remove_tags<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<TagsRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    apply_change(state, item_id, caller, ItemChange::RemoveTags(request.tags)).await
}

async fn reschedule<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    apply_change(
        state,
        item_id,
        caller,
        ItemChange::NextRevisionAt(request.next_revision_at),
    )
    .await
}

// =========================================================================
// POST /items/:item_id/review
// =========================================================================

async fn review_item<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ReviewResponse>, AppError> {
    let result = ReviewItemHandler::new(state.items, state.clock, state.intervals)
        .execute(ReviewItemCommand::new(item_id, caller.user_id))
        .await?;

    Ok(Json(ReviewResponse {
        item: result.item.into(),
        revision: result.revision,
    }))
}

// =========================================================================
// Soft delete / restore
// =========================================================================

async fn delete_item<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    LifecycleHandler::new(state.items, state.clock)
        .execute(LifecycleCommand::delete(item_id, caller.user_id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn restore_item<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = LifecycleHandler::new(state.items, state.clock)
        .execute(LifecycleCommand::restore(item_id, caller.user_id))
        .await?;

    Ok(Json(item.into()))
}

// =========================================================================
// PUT /users/me/reminder
// =========================================================================

async fn register_reminder<R: ReviseItemRepository + Clone>(
    State(state): State<AppState<R>>,
    Extension(caller): Extension<RequestUser>,
    Json(request): Json<ReminderRequest>,
) -> Result<Json<ReminderUser>, AppError> {
    let user = RegisterReminderHandler::new(state.users)
        .execute(RegisterReminderCommand {
            user_id: caller.user_id,
            reminder_time: request.reminder_time,
            utc_offset_minutes: request.utc_offset_minutes,
            display_name: request.display_name,
        })
        .await?;

    Ok(Json(user))
}
