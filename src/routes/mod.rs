pub mod disclosures;
pub mod stocks;
pub mod watchlist;

use std::{error::Error, sync::Arc, time::Instant};

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt, Registry};

use crate::{
    handlers::health::health_check,
    models::stock::Quote,
    routes::{disclosures::disclosure_routes, stocks::stock_routes, watchlist::watchlist_routes},
    utils::{
        config::Config,
        db,
        script_runner::{PythonRunner, ScriptExecutor},
        state::AppState,
        ttl_cache::TtlCache,
    },
};

pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let level = match log_level.as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let filter = filter::Targets::new()
        .with_target("tower_http::trace::on_response", Level::TRACE)
        .with_target("tower_http::trace::on_request", Level::TRACE)
        .with_target("tower_http::trace::make_span", Level::DEBUG)
        .with_target("axum::rejection", Level::TRACE)
        .with_target(env!("CARGO_CRATE_NAME"), level)
        .with_default(Level::INFO);

    let tracing_layer = tracing_subscriber::fmt::layer();

    Registry::default().with(tracing_layer).with(filter).init();
}

/// Connects the database, creates the process-wide quote cache and its
/// sweeper, and wires the router.
pub async fn make_app(config: &Config) -> Result<Router, Box<dyn Error>> {
    info!("Initializing application...");

    let db_pool = db::connect(&config.database_url).await?;
    db::migrate(&db_pool).await?;
    let demo_user_id = db::ensure_user(&db_pool, &config.demo_user_email).await?;
    info!("Database ready, demo user id {}", demo_user_id);

    let scripts: Arc<dyn ScriptExecutor> = Arc::new(PythonRunner::new(config.runner.clone()));
    info!(
        "Scripts run with {} from {}",
        config.runner.interpreter.display(),
        config.runner.scripts_dir.display()
    );

    let quote_cache: Arc<TtlCache<Quote>> = Arc::new(TtlCache::new());
    quote_cache.spawn_sweeper(config.cache_sweep_interval);

    let state = Arc::new(AppState {
        db_pool,
        config: config.clone(),
        scripts,
        quote_cache,
        demo_user_id,
        started_at: Instant::now(),
    });

    info!("Application initialized successfully");
    Ok(app_router(state))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .nest("/stocks", stock_routes())
        .nest("/disclosures", disclosure_routes())
        .nest("/watchlist", watchlist_routes());

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
