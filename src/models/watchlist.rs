use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

#[derive(FromRow, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistItem {
    pub id: i64,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub symbol: String,
    pub name: String,
    #[sqlx(rename = "display_order")]
    pub order: i64,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug)]
pub struct NewWatchlistItem {
    pub symbol: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct OrderUpdate {
    pub id: i64,
    pub order: i64,
}

#[derive(Deserialize, Debug)]
pub struct ReorderRequest {
    pub items: Option<Vec<OrderUpdate>>,
}
