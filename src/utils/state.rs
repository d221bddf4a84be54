use std::{sync::Arc, time::Instant};

use sqlx::SqlitePool;

use crate::{
    models::stock::Quote,
    utils::{config::Config, script_runner::ScriptExecutor, ttl_cache::TtlCache},
};

/// Built once in `make_app` and shared with every handler for the life of
/// the process.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub scripts: Arc<dyn ScriptExecutor>,
    pub quote_cache: Arc<TtlCache<Quote>>,
    /// Owner of every watchlist row until real authentication exists.
    pub demo_user_id: i64,
    pub started_at: Instant,
}
