use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use futures::future::join_all;
use http::StatusCode;
use serde_json::Value;
use tracing::warn;

use crate::{
    models::{
        disclosure::{SymbolDisclosures, WatchlistDisclosureRequest},
        error::ApiError,
        response::ApiResponse,
    },
    utils::{
        params::{positive_param, validate_symbol, validate_symbol_list, MAX_DAYS, MAX_LIMIT},
        script_runner::{ScriptOp, ScriptRequest},
        state::AppState,
    },
};

const DISCLOSURE_FAILED: &str = "Failed to fetch disclosure data";
/// Items fetched per symbol in aggregated lookups.
const AGGREGATE_LIMIT: u32 = 5;

/// Raw disclosure list for one symbol.
pub async fn get_stock_disclosure(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = validate_symbol(&symbol)?;
    let limit = positive_param(&params, "limit", 10, MAX_LIMIT)?;

    let payload = state
        .scripts
        .execute(
            ScriptRequest::new(ScriptOp::Disclosure)
                .arg("--symbol", symbol)
                .arg("--limit", limit.to_string()),
        )
        .await
        .map_err(|e| ApiError::upstream(DISCLOSURE_FAILED, e))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(payload))))
}

/// Major filings of the last `days` days, straight from DART.
pub async fn get_dart_disclosure(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let symbol = validate_symbol(&symbol)?;
    let days = positive_param(&params, "days", 7, MAX_DAYS)?;

    let payload = state
        .scripts
        .execute(
            ScriptRequest::new(ScriptOp::DartDisclosure)
                .arg("--symbol", symbol.clone())
                .arg("--days", days.to_string()),
        )
        .await
        .map_err(|e| ApiError::upstream(DISCLOSURE_FAILED, e))?;

    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        let detail = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("script reported failure");
        return Err(ApiError::upstream(DISCLOSURE_FAILED, detail));
    }

    let data = payload
        .pointer(&format!("/data/{}", symbol))
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| ApiError::not_found("No disclosure data found for this symbol"))?;

    Ok((StatusCode::OK, Json(ApiResponse::ok(data))))
}

/// `GET /api/disclosures?symbols=005930,000660`
pub async fn get_disclosures(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let raw = params.get("symbols").ok_or_else(|| {
        ApiError::validation("Symbols parameter is required (comma-separated)")
    })?;
    let symbols = validate_symbol_list(raw.split(','))?;
    if symbols.is_empty() {
        return Err(ApiError::validation("At least one symbol is required"));
    }
    // accepted for compatibility; the per-symbol script has no date window
    positive_param(&params, "days", 7, MAX_DAYS)?;

    let data = collect_disclosures(&state, symbols).await;
    Ok((StatusCode::OK, Json(ApiResponse::ok(data))))
}

/// `POST /api/disclosures` with `{ "watchlistSymbols": [...] }`
pub async fn post_watchlist_disclosures(
    State(state): State<Arc<AppState>>,
    body: Result<Json<WatchlistDisclosureRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let symbols = request
        .watchlist_symbols
        .ok_or_else(|| ApiError::validation("watchlistSymbols array is required"))?;
    let symbols = validate_symbol_list(&symbols)?;
    if let Some(days) = request.days {
        if days == 0 || days > MAX_DAYS {
            return Err(ApiError::validation(format!(
                "days must be an integer between 1 and {}",
                MAX_DAYS
            )));
        }
    }

    let data = collect_disclosures(&state, symbols).await;
    Ok((StatusCode::OK, Json(ApiResponse::ok(data))))
}

/// One script per symbol, run concurrently. Per-symbol failures end up in
/// the map rather than failing the request.
async fn collect_disclosures(
    state: &AppState,
    symbols: Vec<String>,
) -> BTreeMap<String, SymbolDisclosures> {
    let lookups = symbols.into_iter().map(|symbol| async move {
        let request = ScriptRequest::new(ScriptOp::Disclosure)
            .arg("--symbol", symbol.clone())
            .arg("--limit", AGGREGATE_LIMIT.to_string());
        let result = match state.scripts.execute(request).await {
            Ok(payload) => SymbolDisclosures::from_script(&payload),
            Err(e) => {
                warn!("Disclosure lookup for {} failed: {}", symbol, e);
                SymbolDisclosures::failed(DISCLOSURE_FAILED)
            }
        };
        (symbol, result)
    });
    join_all(lookups).await.into_iter().collect()
}
