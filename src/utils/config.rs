use std::{path::PathBuf, str::FromStr, time::Duration};

use tracing::warn;

use crate::utils::script_runner::{RunnerConfig, ScriptTimeouts};

/// Credentials the data scripts read from their environment.
pub const PASSTHROUGH_ENV: [&str; 5] = [
    "NAVER_CLIENT_ID",
    "NAVER_CLIENT_SECRET",
    "DART_API_KEY",
    "KOREA_INVESTMENT_APP_KEY",
    "KOREA_INVESTMENT_APP_SECRET",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub demo_user_email: String,
    pub stock_listing_path: PathBuf,
    pub quote_cache_ttl: Duration,
    pub cache_sweep_interval: Duration,
    pub runner: RunnerConfig,
}

impl Config {
    pub fn init() -> Self {
        let timeouts = ScriptTimeouts {
            quote: env_millis("SCRIPT_TIMEOUT_QUOTE_MS", 10_000),
            news: env_millis("SCRIPT_TIMEOUT_NEWS_MS", 30_000),
            disclosure: env_millis("SCRIPT_TIMEOUT_DISCLOSURE_MS", 30_000),
            search: env_millis("SCRIPT_TIMEOUT_SEARCH_MS", 180_000),
        };

        let extra_env = PASSTHROUGH_ENV
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();

        Config {
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:3000"),
            database_url: env_or("DATABASE_URL", "sqlite://dashboard.db"),
            demo_user_email: env_or("DEMO_USER_EMAIL", "demo@example.com"),
            stock_listing_path: env_or("STOCK_LISTING_PATH", "all_stocks_cache.json").into(),
            quote_cache_ttl: Duration::from_secs(env_parse("QUOTE_CACHE_TTL_SECS", 30u64)),
            // a zero interval would make the sweeper spin
            cache_sweep_interval: Duration::from_secs(
                env_parse("CACHE_SWEEP_INTERVAL_SECS", 300u64).max(1),
            ),
            runner: RunnerConfig {
                interpreter: env_or("PYTHON_PATH", "python3").into(),
                scripts_dir: env_or("SCRIPTS_DIR", "scripts").into(),
                timeouts,
                extra_env,
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}, using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_millis(key: &str, default: u64) -> Duration {
    Duration::from_millis(env_parse(key, default))
}
