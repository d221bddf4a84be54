use std::sync::Arc;

use axum::{routing::get, Router};

use crate::{
    handlers::disclosures::{get_dart_disclosure, get_disclosures, post_watchlist_disclosures},
    utils::state::AppState,
};

pub fn disclosure_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_disclosures).post(post_watchlist_disclosures))
        .route("/{symbol}", get(get_dart_disclosure))
}
