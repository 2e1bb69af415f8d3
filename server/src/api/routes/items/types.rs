//! Items API request/response types

use serde::{Deserialize, Serialize};

use crate::data::store::Item;

#[derive(Debug, Serialize)]
pub struct ItemDto {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Item> for ItemDto {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            name: item.name,
            image_url: item.image_url,
            like_count: item.like_count,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListItemsResponse {
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Serialize)]
pub struct LikeCountResponse {
    pub item_id: i64,
    pub like_count: i64,
}
