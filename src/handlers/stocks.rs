use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use http::StatusCode;
use tracing::{debug, info};

use crate::{
    models::{
        error::ApiError,
        response::ApiResponse,
        stock::{Quote, ScriptQuote, ScriptSearch, StockSearchResult},
    },
    utils::{
        listing,
        params::{positive_param, validate_symbol, MAX_LIMIT},
        script_runner::{ScriptOp, ScriptRequest},
        state::AppState,
    },
};

const QUOTE_FAILED: &str = "Failed to fetch stock data";
const SEARCH_FAILED: &str = "Stock search failed";

pub fn quote_cache_key(symbol: &str) -> String {
    format!("stock_{}", symbol)
}

/// Cache first; on a miss run the quote script, normalize and store.
pub async fn load_quote(state: &AppState, symbol: &str) -> Result<Quote, ApiError> {
    let key = quote_cache_key(symbol);
    if let Some(quote) = state.quote_cache.get(&key) {
        debug!("Cache HIT for {}", symbol);
        return Ok(quote);
    }
    info!("Cache MISS for {}, fetching", symbol);

    let payload = state
        .scripts
        .execute(ScriptRequest::new(ScriptOp::Quote).arg("--symbol", symbol))
        .await
        .map_err(|e| ApiError::upstream(QUOTE_FAILED, e))?;
    let raw: ScriptQuote =
        serde_json::from_value(payload).map_err(|e| ApiError::upstream(QUOTE_FAILED, e))?;

    let display_name = listing::display_name(&state.config.stock_listing_path, symbol).await;
    let quote = raw
        .into_quote(symbol, display_name)
        .map_err(|e| ApiError::upstream(QUOTE_FAILED, e))?;

    state
        .quote_cache
        .set(key, quote.clone(), state.config.quote_cache_ttl);
    debug!(
        "Cached {} for {:?}",
        symbol, state.config.quote_cache_ttl
    );
    Ok(quote)
}

pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = validate_symbol(&symbol)?;
    let quote = load_quote(&state, &symbol).await?;
    Ok((StatusCode::OK, Json(ApiResponse::ok(quote))))
}

pub async fn search_stocks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params
        .get("q")
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::validation("Query parameter is required"))?
        .to_string();
    let limit = positive_param(&params, "limit", 20, MAX_LIMIT)?;

    let listing_path = state.config.stock_listing_path.to_string_lossy().to_string();
    let request = ScriptRequest::new(ScriptOp::Search)
        .arg("--search", query.clone())
        .arg("--limit", limit.to_string())
        .arg("--cache", listing_path)
        .env("SEARCH_QUERY", query);

    let payload = state
        .scripts
        .execute(request)
        .await
        .map_err(|e| ApiError::upstream(SEARCH_FAILED, e))?;
    let raw: ScriptSearch =
        serde_json::from_value(payload).map_err(|e| ApiError::upstream(SEARCH_FAILED, e))?;
    if !raw.success {
        return Err(ApiError::upstream(
            SEARCH_FAILED,
            raw.error.unwrap_or_else(|| "Search failed".to_string()),
        ));
    }

    let results: Vec<StockSearchResult> = raw.results;
    info!("Search returned {} results", results.len());
    Ok((StatusCode::OK, Json(ApiResponse::ok(results))))
}
