use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use http::StatusCode;

use crate::{
    models::{error::ApiError, response::ApiResponse},
    utils::{
        params::{positive_param, validate_symbol, MAX_LIMIT},
        script_runner::{ScriptOp, ScriptRequest},
        state::AppState,
    },
};

/// News for one symbol. `name` is optional and may be Korean; it travels to
/// the script as a plain argv entry.
pub async fn get_stock_news(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = validate_symbol(&symbol)?;
    let limit = positive_param(&params, "limit", 10, MAX_LIMIT)?;

    let mut request = ScriptRequest::new(ScriptOp::News)
        .arg("--symbol", symbol)
        .arg("--limit", limit.to_string());
    if let Some(name) = params.get("name").map(|n| n.trim()).filter(|n| !n.is_empty()) {
        request = request.arg("--name", name);
    }

    let news = state
        .scripts
        .execute(request)
        .await
        .map_err(|e| ApiError::upstream("Failed to fetch news data", e))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(news))))
}
