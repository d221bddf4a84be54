//! SQLite pool setup and the watchlist queries.

use std::{str::FromStr, time::Duration};

use chrono::Utc;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::models::{
    error::ApiError,
    watchlist::{OrderUpdate, WatchlistItem},
};

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Some(Duration::from_secs(60)))
        .connect_with(options)
        .await
}

/// Single-connection in-memory database, for tests and throwaway runs.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Returns the id of the user with `email`, creating the row if needed.
pub async fn ensure_user(pool: &SqlitePool, email: &str) -> Result<i64, sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO users (email, name, created_at) VALUES (?, ?, ?)")
        .bind(email)
        .bind("Demo User")
        .bind(Utc::now())
        .execute(pool)
        .await?;
    sqlx::query_scalar("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub async fn list_watchlist(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<WatchlistItem>, sqlx::Error> {
    sqlx::query_as::<_, WatchlistItem>(
        "SELECT * FROM watchlist WHERE user_id = ? ORDER BY display_order ASC, id ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Appends `symbol` at the end of the user's list. A second insert of the same
/// (user, symbol) pair is a conflict, never a duplicate row.
pub async fn add_to_watchlist(
    pool: &SqlitePool,
    user_id: i64,
    symbol: &str,
    name: &str,
) -> Result<WatchlistItem, ApiError> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM watchlist WHERE user_id = ? AND symbol = ?")
            .bind(user_id)
            .bind(symbol)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        return Err(already_listed());
    }

    let now = Utc::now();
    let inserted = sqlx::query_as::<_, WatchlistItem>(
        "INSERT INTO watchlist (user_id, symbol, name, display_order, created_at, updated_at) \
         SELECT ?, ?, ?, COALESCE(MAX(display_order), 0) + 1, ?, ? \
         FROM watchlist WHERE user_id = ? \
         RETURNING *",
    )
    .bind(user_id)
    .bind(symbol)
    .bind(name)
    .bind(now)
    .bind(now)
    .bind(user_id)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(item) => Ok(item),
        // lost a race with a concurrent insert of the same symbol
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(already_listed()),
        Err(e) => Err(e.into()),
    }
}

fn already_listed() -> ApiError {
    ApiError::Conflict("Stock already exists in watchlist".to_string())
}

/// Applies all order changes or none of them.
pub async fn reorder_watchlist(
    pool: &SqlitePool,
    user_id: i64,
    items: &[OrderUpdate],
) -> Result<(), ApiError> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();
    for item in items {
        let result = sqlx::query(
            "UPDATE watchlist SET display_order = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(item.order)
        .bind(now)
        .bind(item.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(ApiError::not_found(format!(
                "Watchlist item {} not found",
                item.id
            )));
        }
    }
    tx.commit().await?;
    Ok(())
}

pub async fn remove_by_id(pool: &SqlitePool, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM watchlist WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_by_symbol(
    pool: &SqlitePool,
    user_id: i64,
    symbol: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM watchlist WHERE symbol = ? AND user_id = ?")
        .bind(symbol)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
