//! Items API endpoints
//!
//! CRUD over items plus the like-counter pair: `POST /{id}/like` is the
//! lock-protected increment, `GET /{id}/like` the cache-first read. Item
//! responses carry the durable `like_count`; the `/like` endpoints are the
//! live view.

pub mod types;

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use types::{
    CreateItemRequest, ItemDto, LikeCountResponse, ListItemsResponse, UpdateItemRequest,
};

use crate::api::types::ApiError;
use crate::core::constants::MAX_ITEM_NAME_LEN;
use crate::data::cache::{CacheKey, CacheService};
use crate::data::store::{ItemStore, ItemUpdate, NewItem};
use crate::domain::counter::CounterService;

/// Shared state for Items API endpoints
#[derive(Clone)]
pub struct ItemsApiState {
    pub store: Arc<dyn ItemStore>,
    pub counters: Arc<CounterService>,
    pub cache: Arc<CacheService>,
}

/// Build Items API routes
pub fn routes(
    store: Arc<dyn ItemStore>,
    counters: Arc<CounterService>,
    cache: Arc<CacheService>,
) -> Router<()> {
    let state = ItemsApiState {
        store,
        counters,
        cache,
    };

    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/{id}/like", post(like_item).get(get_like_count))
        .with_state(state)
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() || name.len() > MAX_ITEM_NAME_LEN {
        return Err(ApiError::bad_request(
            "INVALID_NAME",
            format!("name must be 1-{MAX_ITEM_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

/// List all items
pub async fn list_items(
    State(state): State<ItemsApiState>,
) -> Result<Json<ListItemsResponse>, ApiError> {
    let items = state.store.list().await.map_err(ApiError::from_store)?;

    Ok(Json(ListItemsResponse {
        items: items.into_iter().map(ItemDto::from).collect(),
    }))
}

/// Create an item (like count starts at zero)
pub async fn create_item(
    State(state): State<ItemsApiState>,
    Json(body): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemDto>), ApiError> {
    validate_name(&body.name)?;

    let item = state
        .store
        .create(NewItem {
            name: body.name,
            image_url: body.image_url,
        })
        .await
        .map_err(ApiError::from_store)?;

    Ok((StatusCode::CREATED, Json(ItemDto::from(item))))
}

/// Fetch one item
pub async fn get_item(
    State(state): State<ItemsApiState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemDto>, ApiError> {
    let item = state
        .store
        .find_by_id(id)
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("ITEM_NOT_FOUND", format!("Item not found: {id}")))?;

    Ok(Json(ItemDto::from(item)))
}

/// Update item name/image
pub async fn update_item(
    State(state): State<ItemsApiState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<ItemDto>, ApiError> {
    validate_name(&body.name)?;

    let item = state
        .store
        .update(
            id,
            ItemUpdate {
                name: body.name,
                image_url: body.image_url,
            },
        )
        .await
        .map_err(ApiError::from_store)?
        .ok_or_else(|| ApiError::not_found("ITEM_NOT_FOUND", format!("Item not found: {id}")))?;

    Ok(Json(ItemDto::from(item)))
}

/// Delete an item
///
/// The cached counter is invalidated as well so a later reconcile sweep
/// cannot write a count for a row that no longer exists.
pub async fn delete_item(
    State(state): State<ItemsApiState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.store.delete(id).await.map_err(ApiError::from_store)?;
    if !deleted {
        return Err(ApiError::not_found(
            "ITEM_NOT_FOUND",
            format!("Item not found: {id}"),
        ));
    }

    state.cache.invalidate_key(&CacheKey::like_count(id)).await;

    Ok(StatusCode::NO_CONTENT)
}

/// Increment the like count (lock-protected read-modify-write)
pub async fn like_item(
    State(state): State<ItemsApiState>,
    Path(id): Path<i64>,
) -> Result<Json<LikeCountResponse>, ApiError> {
    let like_count = state.counters.increment(id).await?;

    Ok(Json(LikeCountResponse {
        item_id: id,
        like_count,
    }))
}

/// Read the like count (cache-first)
pub async fn get_like_count(
    State(state): State<ItemsApiState>,
    Path(id): Path<i64>,
) -> Result<Json<LikeCountResponse>, ApiError> {
    let like_count = state.counters.read(id).await?;

    Ok(Json(LikeCountResponse {
        item_id: id,
        like_count,
    }))
}
