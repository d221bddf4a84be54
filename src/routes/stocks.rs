use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{
    handlers::{
        disclosures::get_stock_disclosure,
        news::get_stock_news,
        stocks::{get_quote, search_stocks},
    },
    utils::state::AppState,
};

pub fn stock_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(search_stocks))
        .route("/{symbol}", get(get_quote))
        .route("/{symbol}/news", get(get_stock_news))
        .route("/{symbol}/disclosure", get(get_stock_disclosure))
}
