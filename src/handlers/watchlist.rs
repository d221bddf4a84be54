use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use http::StatusCode;
use tracing::info;

use crate::{
    models::{
        error::ApiError,
        response::ApiResponse,
        watchlist::{NewWatchlistItem, ReorderRequest},
    },
    utils::{db, params::validate_symbol, state::AppState},
};

pub async fn get_watchlist(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let items = db::list_watchlist(&state.db_pool, state.demo_user_id).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(items))))
}

pub async fn add_watchlist_item(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NewWatchlistItem>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = body?;
    let (Some(symbol), Some(name)) = (
        payload.symbol.filter(|s| !s.trim().is_empty()),
        payload.name.filter(|n| !n.trim().is_empty()),
    ) else {
        return Err(ApiError::validation("Symbol and name are required"));
    };
    let symbol = validate_symbol(&symbol)?;

    let item =
        db::add_to_watchlist(&state.db_pool, state.demo_user_id, &symbol, name.trim()).await?;
    info!("Added {} to watchlist at position {}", item.symbol, item.order);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(item))))
}

pub async fn reorder_watchlist(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = body?;
    let items = payload
        .items
        .ok_or_else(|| ApiError::validation("Items array is required"))?;

    db::reorder_watchlist(&state.db_pool, state.demo_user_id, &items).await?;
    Ok((
        StatusCode::OK,
        Json(ApiResponse::done("Watchlist order updated successfully")),
    ))
}

pub async fn delete_watchlist_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::validation("ID parameter must be an integer"))?;

    if !db::remove_by_id(&state.db_pool, state.demo_user_id, id).await? {
        return Err(ApiError::not_found("Watchlist item not found"));
    }
    Ok((
        StatusCode::OK,
        Json(ApiResponse::done("Watchlist item deleted successfully")),
    ))
}

pub async fn delete_watchlist_symbol(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = validate_symbol(&symbol)?;

    if !db::remove_by_symbol(&state.db_pool, state.demo_user_id, &symbol).await? {
        return Err(ApiError::not_found("Watchlist item not found"));
    }
    Ok((
        StatusCode::OK,
        Json(ApiResponse::done("Watchlist item deleted successfully")),
    ))
}
