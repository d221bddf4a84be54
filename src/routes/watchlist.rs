use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};

use crate::{
    handlers::watchlist::{
        add_watchlist_item, delete_watchlist_item, delete_watchlist_symbol, get_watchlist,
        reorder_watchlist,
    },
    utils::state::AppState,
};

pub fn watchlist_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(get_watchlist)
                .post(add_watchlist_item)
                .put(reorder_watchlist),
        )
        .route("/{id}", delete(delete_watchlist_item))
        .route("/by-symbol/{symbol}", delete(delete_watchlist_symbol))
}
