use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use http::StatusCode;
use serde_json::json;

use crate::utils::{script_runner::scripts_dir_present, state::AppState};

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let runner = &state.config.runner;
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "timestamp": Utc::now().to_rfc3339(),
            "uptimeSecs": state.started_at.elapsed().as_secs(),
            "cachedQuotes": state.quote_cache.len(),
            "interpreter": runner.interpreter.display().to_string(),
            "scriptsDirPresent": scripts_dir_present(&runner.scripts_dir),
        })),
    )
        .into_response()
}
